use serde::{Deserialize, Serialize};
use serde_inline_default::serde_inline_default;

use crate::{error::TermBridgeError, model::ConfidenceTier};

pub(crate) mod comparers;
pub(crate) mod metrics;
pub(crate) mod normalizer;
pub(crate) mod ranker;
pub(crate) mod searchable;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.6;
pub const DEFAULT_HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// A single string similarity measure over two normalized texts.
pub trait Metric: Send + Sync {
  fn name(&self) -> &'static str;
  fn similarity(&self, lhs: &str, rhs: &str) -> f64;
}

/// Cutoffs applied to composite scores.
///
/// Candidates scoring strictly below `similarity` are discarded by the
/// ranker, and the remaining ones are split into tiers at `high_confidence`.
#[serde_inline_default]
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct Thresholds {
  #[serde_inline_default(DEFAULT_SIMILARITY_THRESHOLD)]
  pub similarity: f64,
  #[serde_inline_default(DEFAULT_HIGH_CONFIDENCE_THRESHOLD)]
  pub high_confidence: f64,
}

impl Default for Thresholds {
  fn default() -> Self {
    Thresholds {
      similarity: DEFAULT_SIMILARITY_THRESHOLD,
      high_confidence: DEFAULT_HIGH_CONFIDENCE_THRESHOLD,
    }
  }
}

impl Thresholds {
  /// Both cutoffs must lie in [0, 1], with `similarity <= high_confidence`.
  pub fn validate(&self) -> Result<(), TermBridgeError> {
    let unit = 0.0..=1.0;

    if !unit.contains(&self.similarity) || !unit.contains(&self.high_confidence) {
      return Err(TermBridgeError::ConfigError("thresholds must be between 0 and 1".into()));
    }
    if self.similarity > self.high_confidence {
      return Err(TermBridgeError::ConfigError("similarity threshold cannot exceed the high confidence threshold".into()));
    }

    Ok(())
  }

  pub fn classify(&self, score: f64) -> ConfidenceTier {
    if score >= self.high_confidence {
      ConfidenceTier::High
    } else if score >= self.similarity {
      ConfidenceTier::Medium
    } else {
      ConfidenceTier::Low
    }
  }
}

#[cfg(test)]
mod tests {
  use super::Thresholds;
  use crate::{error::TermBridgeError, model::ConfidenceTier};

  #[test]
  fn classify_boundaries() {
    let thresholds = Thresholds::default();

    assert_eq!(thresholds.classify(1.0), ConfidenceTier::High);
    assert_eq!(thresholds.classify(0.8), ConfidenceTier::High);
    assert_eq!(thresholds.classify(0.79), ConfidenceTier::Medium);
    assert_eq!(thresholds.classify(0.6), ConfidenceTier::Medium);
    assert_eq!(thresholds.classify(0.59), ConfidenceTier::Low);
    assert_eq!(thresholds.classify(0.0), ConfidenceTier::Low);
  }

  #[test]
  fn classify_custom() {
    let thresholds = Thresholds {
      similarity: 0.3,
      high_confidence: 0.5,
    };

    assert_eq!(thresholds.classify(0.5), ConfidenceTier::High);
    assert_eq!(thresholds.classify(0.4), ConfidenceTier::Medium);
    assert_eq!(thresholds.classify(0.2), ConfidenceTier::Low);
  }

  #[test]
  fn validate() {
    assert!(Thresholds::default().validate().is_ok());
    assert!(Thresholds { similarity: 0.8, high_confidence: 0.8 }.validate().is_ok());
    assert!(Thresholds { similarity: 0.9, high_confidence: 0.8 }.validate().is_err());
    assert!(Thresholds { similarity: -0.1, high_confidence: 0.8 }.validate().is_err());
    assert!(Thresholds { similarity: 0.6, high_confidence: 1.2 }.validate().is_err());
    assert!(Thresholds { similarity: f64::NAN, high_confidence: 0.8 }.validate().is_err());
  }

  #[test]
  fn deserialize_defaults() {
    let thresholds: Thresholds = serde_json::from_str(r#"{"similarity": 0.5}"#).unwrap();

    assert_eq!(thresholds.similarity, 0.5);
    assert_eq!(thresholds.high_confidence, 0.8);
  }
}
