use bon::bon;
use serde::Serialize;
use tracing::instrument;

use crate::{
  error::TermBridgeError,
  generator::{GenerateOptions, GenerationReport, MappingGenerator},
  matching::{Thresholds, ranker::MatchRanker},
  model::{CodeEntry, CodeSystem, ConfidenceTier, HasText, Mapping, MappingFilter, SourceCode, StoredMapping, TargetCode},
  store::Store,
};

/// A code returned from a free-text search, with its similarity to the query.
#[derive(Clone, Debug, Serialize)]
pub struct SearchHit {
  pub system: CodeSystem,
  #[serde(flatten)]
  pub entry: CodeEntry,
  pub score: f64,
  pub confidence: ConfidenceTier,
}

/// Stored mappings for a code, in either direction.
#[derive(Clone, Debug, Serialize)]
pub struct Translation {
  pub system: CodeSystem,
  pub code: String,
  pub mappings: Vec<StoredMapping>,
}

/// The main entrypoint for using the TermBridge library.
///
/// It ties a [`Store`] holding both terminologies and the generated mappings
/// to the similarity ranker.
///
/// # Examples
///
/// ```rust
/// # use libtermbridge::prelude::*;
///
/// # tokio_test::block_on(async {
///   let bridge = TermBridge::new(MemoryStore::default()).build().unwrap();
///
///   bridge.ingest_source_codes(vec![SourceCode::builder("SR11").display("Jwara").name_english("Fever").build()]).await.unwrap();
///   bridge.ingest_target_codes(vec![TargetCode::builder("MG26").title("Fever of other or unknown origin").build()]).await.unwrap();
///
///   for hit in bridge.search(CodeSystem::Icd11, "fever", 5).await.unwrap() {
///     println!("{} scored {}", hit.entry.as_text().code(), hit.score);
///   }
/// # });
/// ```
#[derive(Clone, Debug)]
pub struct TermBridge<S: Store> {
  store: S,
  ranker: MatchRanker,
}

#[bon]
impl<S: Store> TermBridge<S> {
  /// Create a new TermBridge instance over the given store.
  ///
  /// Thresholds default to a 0.6 similarity floor and a 0.8 high confidence
  /// cutoff, and are rejected if they are out of order or out of range.
  #[allow(clippy::new_ret_no_self)]
  #[builder(start_fn = new, finish_fn = build)]
  pub fn _new(#[builder(start_fn)] store: S, #[builder(default)] thresholds: Thresholds) -> Result<TermBridge<S>, TermBridgeError> {
    thresholds.validate()?;

    Ok(TermBridge {
      store,
      ranker: MatchRanker::new(thresholds),
    })
  }
}

impl<S: Store> TermBridge<S> {
  pub fn thresholds(&self) -> &Thresholds {
    self.ranker.thresholds()
  }

  /// Retrieve the backing store availability.
  pub async fn health(&self) -> Result<bool, TermBridgeError> {
    self.store.health().await
  }

  /// Insert or replace NAMASTE codes, keyed by code.
  pub async fn ingest_source_codes(&self, codes: Vec<SourceCode>) -> Result<usize, TermBridgeError> {
    check_codes(&codes)?;

    let count = self.store.put_source_codes(codes).await?;

    tracing::info!(system = CodeSystem::Namaste.id(), count, "ingested codes");

    Ok(count)
  }

  /// Insert or replace ICD-11 codes, keyed by code.
  pub async fn ingest_target_codes(&self, codes: Vec<TargetCode>) -> Result<usize, TermBridgeError> {
    check_codes(&codes)?;

    let count = self.store.put_target_codes(codes).await?;

    tracing::info!(system = CodeSystem::Icd11.id(), count, "ingested codes");

    Ok(count)
  }

  /// All known codes of a terminology, in ingestion order.
  pub async fn codes(&self, system: CodeSystem) -> Result<Vec<CodeEntry>, TermBridgeError> {
    Ok(match system {
      CodeSystem::Namaste => self.store.source_codes().await?.into_iter().map(CodeEntry::Source).collect(),
      CodeSystem::Icd11 => self.store.target_codes().await?.into_iter().map(CodeEntry::Target).collect(),
    })
  }

  pub async fn lookup(&self, system: CodeSystem, code: &str) -> Result<CodeEntry, TermBridgeError> {
    let entry = match system {
      CodeSystem::Namaste => self.store.source_code(code).await?.map(CodeEntry::Source),
      CodeSystem::Icd11 => self.store.target_code(code).await?.map(CodeEntry::Target),
    };

    entry.ok_or(TermBridgeError::ResourceNotFound)
  }

  /// Free-text search over one terminology.
  ///
  /// Unlike mapping suggestions, hits are not cut at the similarity
  /// threshold, so every tier may be returned.
  #[instrument(skip_all, fields(system = system.id()))]
  pub async fn search(&self, system: CodeSystem, query: &str, limit: usize) -> Result<Vec<SearchHit>, TermBridgeError> {
    let hits = match system {
      CodeSystem::Namaste => {
        let codes = self.store.source_codes().await?;

        self
          .ranker
          .search(query, &codes, limit)
          .into_iter()
          .map(|ranked| (CodeEntry::Source(codes[ranked.index].clone()), ranked.similarity.score))
          .collect::<Vec<_>>()
      }

      CodeSystem::Icd11 => {
        let codes = self.store.target_codes().await?;

        self
          .ranker
          .search(query, &codes, limit)
          .into_iter()
          .map(|ranked| (CodeEntry::Target(codes[ranked.index].clone()), ranked.similarity.score))
          .collect::<Vec<_>>()
      }
    };

    Ok(
      hits
        .into_iter()
        .map(|(entry, score)| SearchHit {
          system,
          entry,
          score,
          confidence: self.ranker.thresholds().classify(score),
        })
        .collect(),
    )
  }

  /// Best ICD-11 candidates for a stored NAMASTE code, without persisting them.
  #[instrument(skip_all, fields(code = code))]
  pub async fn suggest(&self, code: &str, max_results: usize) -> Result<Vec<Mapping>, TermBridgeError> {
    let source = self.store.source_code(code).await?.ok_or(TermBridgeError::ResourceNotFound)?;
    let targets = self.store.target_codes().await?;

    Ok(self.ranker.find_best_matches(&source, &targets, max_results))
  }

  /// Generate mappings for every stored NAMASTE code against every stored ICD-11 code.
  pub async fn generate(&self, options: &GenerateOptions) -> Result<GenerationReport, TermBridgeError> {
    let sources = self.store.source_codes().await?;
    let targets = self.store.target_codes().await?;

    Ok(MappingGenerator::new(&self.store, self.ranker).generate(&sources, &targets, options).await)
  }

  /// Stored mappings for a code, best first.
  ///
  /// NAMASTE codes are translated forward, ICD-11 codes are resolved to the
  /// NAMASTE codes mapped onto them.
  pub async fn translate(&self, system: CodeSystem, code: &str) -> Result<Translation, TermBridgeError> {
    let filter = match system {
      CodeSystem::Namaste => MappingFilter {
        source_code: Some(code.to_string()),
        ..Default::default()
      },
      CodeSystem::Icd11 => MappingFilter {
        target_code: Some(code.to_string()),
        ..Default::default()
      },
    };

    let mut mappings = self.store.query_mappings(&filter).await?;

    mappings.sort_by(|lhs, rhs| rhs.mapping.score.total_cmp(&lhs.mapping.score));

    Ok(Translation {
      system,
      code: code.to_string(),
      mappings,
    })
  }

  pub async fn mappings(&self, filter: &MappingFilter) -> Result<Vec<StoredMapping>, TermBridgeError> {
    self.store.query_mappings(filter).await
  }
}

fn check_codes<T: HasText>(codes: &[T]) -> Result<(), TermBridgeError> {
  if codes.iter().any(|code| code.code().trim().is_empty()) {
    return Err(TermBridgeError::InvalidCode("codes cannot be empty".into()));
  }

  Ok(())
}
