use metrics::histogram;

use crate::{
  matching::{
    Metric,
    metrics::{PartialRatio, Ratio, TokenSetRatio, TokenSortRatio},
    normalizer::normalize,
  },
  model::SimilarityResult,
};

/// Metrics and their weight in the composite score.
///
/// Whole-string similarity carries twice the weight of each of the more
/// permissive substring and token-based metrics.
pub const METRICS: [(&dyn Metric, f64); 4] = [(&Ratio, 0.4), (&PartialRatio, 0.2), (&TokenSortRatio, 0.2), (&TokenSetRatio, 0.2)];

/// Compute the composite similarity between two free texts.
///
/// Both texts are normalized first. If either ends up empty, every score is
/// zero.
pub fn score(lhs: &str, rhs: &str) -> SimilarityResult {
  let (lhs, rhs) = (normalize(Some(lhs)), normalize(Some(rhs)));

  if lhs.is_empty() || rhs.is_empty() {
    return SimilarityResult::default();
  }

  let scores = METRICS.map(|(metric, _)| {
    let score = metric.similarity(&lhs, &rhs);

    tracing::trace!(metric = metric.name(), score = score, "computed metric");

    score
  });

  let composite = METRICS.iter().zip(scores).map(|((_, weight), score)| weight * score).sum::<f64>().clamp(0.0, 1.0);

  histogram!("termbridge_similarity_scores").record(composite);

  SimilarityResult {
    score: composite,
    ratio: scores[0],
    partial_ratio: scores[1],
    token_sort_ratio: scores[2],
    token_set_ratio: scores[3],
  }
}
