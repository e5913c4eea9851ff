use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_inline_default::serde_inline_default;
use tracing::instrument;

use crate::{
  matching::ranker::MatchRanker,
  model::{ConfidenceTier, Mapping, SourceCode, TargetCode},
  store::{MappingStore, Upsert},
};

#[serde_inline_default]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GenerateOptions {
  #[serde_inline_default(3)]
  pub max_matches_per_code: usize,
  #[serde_inline_default(true)]
  pub save_to_database: bool,
  #[serde_inline_default(false)]
  pub overwrite_existing: bool,
}

impl Default for GenerateOptions {
  fn default() -> Self {
    GenerateOptions {
      max_matches_per_code: 3,
      save_to_database: true,
      overwrite_existing: false,
    }
  }
}

#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct GenerationStats {
  pub total: usize,
  pub high: usize,
  pub medium: usize,
  pub persisted: usize,
  pub skipped: usize,
  pub failed: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GenerationReport {
  pub all: Vec<Mapping>,
  pub high: Vec<Mapping>,
  pub medium: Vec<Mapping>,
  pub stats: GenerationStats,
}

/// Runs the ranker over a whole batch of source codes and persists the results.
pub struct MappingGenerator<'s, S: MappingStore> {
  store: &'s S,
  ranker: MatchRanker,
}

impl<'s, S: MappingStore> MappingGenerator<'s, S> {
  pub fn new(store: &'s S, ranker: MatchRanker) -> Self {
    MappingGenerator { store, ranker }
  }

  /// Generate mappings for every source code against every target code.
  ///
  /// Writes are issued one at a time, right after each mapping is produced,
  /// when `save_to_database` is set. A failed write is logged and counted,
  /// and the batch carries on.
  #[instrument(name = "generate_mappings", skip_all, fields(sources = sources.len(), targets = targets.len()))]
  pub async fn generate(&self, sources: &[SourceCode], targets: &[TargetCode], options: &GenerateOptions) -> GenerationReport {
    let mut report = GenerationReport::default();

    for source in sources {
      for mapping in self.ranker.find_best_matches(source, targets, options.max_matches_per_code) {
        if options.save_to_database {
          match self.store.upsert_mapping(&mapping, options.overwrite_existing).await {
            Ok(Upsert::Written) => report.stats.persisted += 1,
            Ok(Upsert::Skipped) => report.stats.skipped += 1,

            Err(err) => {
              tracing::warn!(error = err.to_string(), source = mapping.source_code, target = mapping.target_code, "could not persist mapping");
              counter!("termbridge_mapping_write_failures_total").increment(1);

              report.stats.failed += 1;
            }
          }
        }

        report.all.push(mapping);
      }
    }

    for mapping in &report.all {
      match mapping.confidence {
        ConfidenceTier::High => report.high.push(mapping.clone()),
        ConfidenceTier::Medium => report.medium.push(mapping.clone()),
        ConfidenceTier::Low => {}
      }
    }

    report.stats.total = report.all.len();
    report.stats.high = report.high.len();
    report.stats.medium = report.medium.len();

    counter!("termbridge_generated_mappings_total").increment(report.stats.total as u64);

    tracing::info!(
      total = report.stats.total,
      high = report.stats.high,
      medium = report.stats.medium,
      persisted = report.stats.persisted,
      failed = report.stats.failed,
      "generated mappings"
    );

    report
  }
}
