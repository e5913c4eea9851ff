use std::cmp::Ordering;

use tracing::instrument;

use crate::{
  matching::{Thresholds, searchable::build_searchable_text},
  model::{HasText, Mapping, SimilarityResult, SourceCode, TargetCode},
  scoring,
};

pub const DEFAULT_MAX_RESULTS: usize = 5;

/// A scored candidate, pointing back into the slice it was ranked from.
#[derive(Clone, Debug)]
pub struct Ranked {
  pub index: usize,
  pub similarity: SimilarityResult,
  pub text: String,
}

/// Scores candidate codes against a piece of text and keeps the best ones.
#[derive(Clone, Copy, Debug, Default)]
pub struct MatchRanker {
  thresholds: Thresholds,
}

impl MatchRanker {
  pub fn new(thresholds: Thresholds) -> MatchRanker {
    MatchRanker { thresholds }
  }

  pub fn thresholds(&self) -> &Thresholds {
    &self.thresholds
  }

  /// Find the best target codes for a source code.
  ///
  /// Candidates below the similarity threshold are dropped, so no returned
  /// mapping is ever classified as `low`. Equal scores keep the order of
  /// `targets`.
  #[instrument(name = "find_best_matches", skip_all, fields(source = source.code, candidates = targets.len()))]
  pub fn find_best_matches(&self, source: &SourceCode, targets: &[TargetCode], max_results: usize) -> Vec<Mapping> {
    let source_text = build_searchable_text(source);

    self
      .rank(&source_text, targets, max_results)
      .into_iter()
      .map(|ranked| {
        let target = &targets[ranked.index];
        let confidence = self.thresholds.classify(ranked.similarity.score);

        Mapping {
          source_code: source.code.clone(),
          target_code: target.code.clone(),
          target_display: target.display().map(ToString::to_string),
          score: ranked.similarity.score,
          confidence,
          equivalence: confidence.equivalence(),
          details: ranked.similarity,
          source_text: source_text.clone(),
          target_text: ranked.text,
        }
      })
      .collect()
  }

  /// Rank candidates against `text`, keeping those at or above the similarity threshold.
  pub fn rank<T: HasText>(&self, text: &str, candidates: &[T], max_results: usize) -> Vec<Ranked> {
    self.rank_with_floor(text, candidates, max_results, self.thresholds.similarity)
  }

  /// Rank candidates against `text` without any similarity floor, only
  /// dropping candidates that share nothing with it.
  pub fn search<T: HasText>(&self, text: &str, candidates: &[T], max_results: usize) -> Vec<Ranked> {
    self.rank_with_floor(text, candidates, max_results, f64::MIN_POSITIVE)
  }

  fn rank_with_floor<T: HasText>(&self, text: &str, candidates: &[T], max_results: usize, floor: f64) -> Vec<Ranked> {
    let mut ranked = candidates
      .iter()
      .enumerate()
      .filter_map(|(index, candidate)| {
        let candidate_text = build_searchable_text(candidate);
        let similarity = scoring::score(text, &candidate_text);

        tracing::debug!(candidate = candidate.code(), score = similarity.score, "computed similarity");

        (similarity.score >= floor).then_some(Ranked {
          index,
          similarity,
          text: candidate_text,
        })
      })
      .collect::<Vec<_>>();

    // Stable, so ties keep their input order.
    ranked.sort_by(|lhs, rhs| rhs.similarity.score.partial_cmp(&lhs.similarity.score).unwrap_or(Ordering::Equal));
    ranked.truncate(max_results);
    ranked
  }
}

#[cfg(test)]
mod tests {
  use float_cmp::approx_eq;

  use super::MatchRanker;
  use crate::{
    matching::Thresholds,
    model::{ConfidenceTier, Equivalence, SourceCode, TargetCode},
  };

  fn targets() -> Vec<TargetCode> {
    vec![
      TargetCode::builder("SM10").display("Gastro-intestinal disorders").build(),
      TargetCode::builder("SK00").display("Head, brain, nerve disorders").build(),
    ]
  }

  #[test]
  fn end_to_end_scenario() {
    let source = SourceCode::builder("A").display("gastro-intestinal disorder").build();
    let matches = MatchRanker::default().find_best_matches(&source, &targets(), 5);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].source_code, "A");
    assert_eq!(matches[0].target_code, "SM10");
    assert_eq!(matches[0].target_display.as_deref(), Some("Gastro-intestinal disorders"));
    assert_eq!(matches[0].confidence, ConfidenceTier::High);
    assert_eq!(matches[0].equivalence, Equivalence::Equivalent);
    assert!(matches[0].score >= 0.8);
    assert_eq!(matches[0].source_text, "gastro-intestinal disorder");
    assert_eq!(matches[0].target_text, "Gastro-intestinal disorders");
  }

  #[test]
  fn excluded_candidate_is_below_floor() {
    let source = SourceCode::builder("A").display("gastro-intestinal disorder").build();
    let ranked = MatchRanker::default().search("gastro-intestinal disorder", &targets(), 5);

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[1].index, 1);
    assert!(ranked[1].similarity.score < 0.6);

    let matches = MatchRanker::default().find_best_matches(&source, &targets(), 5);

    assert!(matches.iter().all(|m| m.target_code != "SK00"));
  }

  #[test]
  fn sorted_truncated_and_floored() {
    let source = SourceCode::builder("B").display("fever").build();
    let targets = vec![
      TargetCode::builder("1").display("fever with chills").build(),
      TargetCode::builder("2").display("Fever").build(),
      TargetCode::builder("3").display("cough").build(),
      TargetCode::builder("4").display("fevers").build(),
      TargetCode::builder("5").display("fever").build(),
    ];

    let matches = MatchRanker::default().find_best_matches(&source, &targets, 3);

    assert_eq!(matches.len(), 3);
    assert!(matches.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(matches.iter().all(|m| m.score >= 0.6));
    assert_eq!(matches[0].target_code, "2");
    assert_eq!(matches[1].target_code, "5");
    assert_eq!(matches[2].target_code, "4");
  }

  #[test]
  fn medium_confidence() {
    let source = SourceCode::builder("C").display("headache").build();
    let targets = vec![TargetCode::builder("8A80").title("Headache disorders").build()];
    let matches = MatchRanker::default().find_best_matches(&source, &targets, 5);

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].confidence, ConfidenceTier::Medium);
    assert_eq!(matches[0].equivalence, Equivalence::RelatedTo);
    assert!(approx_eq!(f64, matches[0].score, 0.7692, epsilon = 0.001));
  }

  #[test]
  fn custom_thresholds() {
    let source = SourceCode::builder("C").display("headache").build();
    let targets = vec![TargetCode::builder("8A80").title("Headache disorders").build()];

    let strict = MatchRanker::new(Thresholds {
      similarity: 0.9,
      high_confidence: 0.95,
    });

    assert!(strict.find_best_matches(&source, &targets, 5).is_empty());

    let lenient = MatchRanker::new(Thresholds {
      similarity: 0.5,
      high_confidence: 0.7,
    });

    assert_eq!(lenient.find_best_matches(&source, &targets, 5)[0].confidence, ConfidenceTier::High);
  }

  #[test]
  fn zero_max_results() {
    let source = SourceCode::builder("A").display("gastro-intestinal disorder").build();

    assert!(MatchRanker::default().find_best_matches(&source, &targets(), 0).is_empty());
  }

  #[test]
  fn empty_source_text() {
    let source = SourceCode::builder("A").display("-").build();

    assert!(MatchRanker::default().find_best_matches(&source, &targets(), 5).is_empty());
    assert!(MatchRanker::default().search("", &targets(), 5).is_empty());
  }
}
