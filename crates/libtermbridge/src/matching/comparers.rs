use std::collections::BTreeSet;

use itertools::Itertools;
use rapidfuzz::distance::indel;

/// Above this, a partial alignment is considered a perfect substring match.
const PARTIAL_PERFECT: f64 = 0.995;

/// InDel-normalized similarity between two strings, in [0, 1].
#[inline]
pub(crate) fn ratio(lhs: &str, rhs: &str) -> f64 {
  indel::normalized_similarity(lhs.chars(), rhs.chars())
}

#[inline]
fn ratio_chars(lhs: &[char], rhs: &[char]) -> f64 {
  indel::normalized_similarity(lhs.iter().copied(), rhs.iter().copied())
}

/// Best ratio between the shorter string and any window of the longer one
/// anchored on a common block.
pub(crate) fn partial_ratio(lhs: &str, rhs: &str) -> f64 {
  let lhs = lhs.chars().collect::<Vec<_>>();
  let rhs = rhs.chars().collect::<Vec<_>>();

  let (shorter, longer) = if lhs.len() <= rhs.len() { (&lhs, &rhs) } else { (&rhs, &lhs) };

  if shorter.is_empty() {
    return 0.0;
  }

  let mut best = 0.0f64;

  for (short_start, long_start, _) in matching_blocks(shorter, longer) {
    let start = long_start.saturating_sub(short_start);
    let end = (start + shorter.len()).min(longer.len());
    let score = ratio_chars(shorter, &longer[start..end]);

    if score > PARTIAL_PERFECT {
      return 1.0;
    }

    best = best.max(score);
  }

  best
}

pub(crate) fn token_sort_ratio(lhs: &str, rhs: &str) -> f64 {
  ratio(&sorted_tokens(lhs), &sorted_tokens(rhs))
}

pub(crate) fn token_set_ratio(lhs: &str, rhs: &str) -> f64 {
  let lhs_tokens = lhs.split_whitespace().collect::<BTreeSet<_>>();
  let rhs_tokens = rhs.split_whitespace().collect::<BTreeSet<_>>();

  let intersection = lhs_tokens.intersection(&rhs_tokens).join(" ");
  let lhs_only = lhs_tokens.difference(&rhs_tokens).join(" ");
  let rhs_only = rhs_tokens.difference(&lhs_tokens).join(" ");

  let lhs_combined = format!("{intersection} {lhs_only}");
  let rhs_combined = format!("{intersection} {rhs_only}");
  let (lhs_combined, rhs_combined) = (lhs_combined.trim(), rhs_combined.trim());

  [ratio(&intersection, lhs_combined), ratio(&intersection, rhs_combined), ratio(lhs_combined, rhs_combined)]
    .into_iter()
    .fold(0.0, f64::max)
}

#[inline]
fn sorted_tokens(text: &str) -> String {
  text.split_whitespace().sorted_unstable().join(" ")
}

/// Non-overlapping common blocks `(lhs_start, rhs_start, len)`, found by
/// recursively taking the longest common substring on each side of the
/// previous one. Sorted, and terminated by a zero-length sentinel block.
pub(crate) fn matching_blocks(lhs: &[char], rhs: &[char]) -> Vec<(usize, usize, usize)> {
  let mut queue = vec![(0, lhs.len(), 0, rhs.len())];
  let mut blocks = Vec::new();

  while let Some((lhs_lo, lhs_hi, rhs_lo, rhs_hi)) = queue.pop() {
    let (i, j, len) = longest_match(lhs, rhs, (lhs_lo, lhs_hi), (rhs_lo, rhs_hi));

    if len == 0 {
      continue;
    }

    blocks.push((i, j, len));

    if lhs_lo < i && rhs_lo < j {
      queue.push((lhs_lo, i, rhs_lo, j));
    }
    if i + len < lhs_hi && j + len < rhs_hi {
      queue.push((i + len, lhs_hi, j + len, rhs_hi));
    }
  }

  blocks.sort_unstable();
  blocks.push((lhs.len(), rhs.len(), 0));
  blocks
}

/// Longest common substring within the given ranges, preferring the earliest
/// position in `lhs`, then in `rhs`.
fn longest_match(lhs: &[char], rhs: &[char], (lhs_lo, lhs_hi): (usize, usize), (rhs_lo, rhs_hi): (usize, usize)) -> (usize, usize, usize) {
  let (mut best_i, mut best_j, mut best_len) = (lhs_lo, rhs_lo, 0);

  // lengths[k + 1] holds the run length ending at rhs[rhs_lo + k] for the previous lhs row.
  let mut previous = vec![0usize; rhs_hi - rhs_lo + 1];
  let mut current = vec![0usize; rhs_hi - rhs_lo + 1];

  for i in lhs_lo..lhs_hi {
    for j in rhs_lo..rhs_hi {
      let k = j - rhs_lo;

      current[k + 1] = if lhs[i] == rhs[j] { previous[k] + 1 } else { 0 };

      if current[k + 1] > best_len {
        best_len = current[k + 1];
        best_i = i + 1 - best_len;
        best_j = j + 1 - best_len;
      }
    }

    std::mem::swap(&mut previous, &mut current);
  }

  (best_i, best_j, best_len)
}
