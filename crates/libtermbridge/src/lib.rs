mod error;
mod generator;
mod matching;
mod model;
mod store;
mod termbridge;

pub mod scoring;

pub mod prelude {
  pub use crate::error::TermBridgeError;
  pub use crate::generator::{GenerateOptions, GenerationReport, GenerationStats, MappingGenerator};
  pub use crate::matching::{
    DEFAULT_HIGH_CONFIDENCE_THRESHOLD, DEFAULT_SIMILARITY_THRESHOLD, Metric, Thresholds,
    normalizer::normalize,
    ranker::{DEFAULT_MAX_RESULTS, MatchRanker, Ranked},
    searchable::build_searchable_text,
  };
  pub use crate::model::{
    CodeEntry, CodeSystem, ConfidenceTier, Equivalence, HasText, ICD11_SYSTEM, Mapping, MappingFilter, NAMASTE_SYSTEM, SimilarityResult, SourceCode, StoredMapping, TargetCode,
    TextField,
  };
  pub use crate::store::{CodeStore, MappingStore, Store, Upsert, sqlite::SqliteStore};
  pub use crate::termbridge::{SearchHit, TermBridge, Translation};

  pub use crate::store::mock::MemoryStore;
}
