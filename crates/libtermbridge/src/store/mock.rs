use std::{
  collections::HashMap,
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

use ahash::RandomState;
use bon::bon;
use jiff::Timestamp;
use tokio::sync::RwLock;

use crate::{
  error::TermBridgeError,
  model::{HasText, Mapping, MappingFilter, SourceCode, StoredMapping, TargetCode},
  store::{CodeStore, MappingStore, Upsert},
};

#[derive(Debug, Default)]
struct MemoryState {
  sources: Vec<SourceCode>,
  targets: Vec<TargetCode>,
  mappings: Vec<StoredMapping>,
  // (source, target) to position in `mappings`.
  pairs: HashMap<(String, String), usize, RandomState>,
}

/// In-memory store, mostly useful for tests.
#[derive(Clone, Debug)]
pub struct MemoryStore {
  state: Arc<RwLock<MemoryState>>,
  healthy: bool,
  fail_writes: bool,
  write_attempts: Arc<AtomicUsize>,
}

impl Default for MemoryStore {
  fn default() -> Self {
    MemoryStore::builder().build()
  }
}

#[bon]
impl MemoryStore {
  #[builder]
  pub fn builder(
    #[builder(default = true)] healthy: bool,
    #[builder(default)] fail_writes: bool,
    #[builder(default)] sources: Vec<SourceCode>,
    #[builder(default)] targets: Vec<TargetCode>,
  ) -> MemoryStore {
    MemoryStore {
      state: Arc::new(RwLock::new(MemoryState {
        sources,
        targets,
        mappings: Vec::new(),
        pairs: HashMap::default(),
      })),
      healthy,
      fail_writes,
      write_attempts: Arc::default(),
    }
  }

  /// Number of mapping writes attempted so far, failed ones included.
  pub fn write_attempts(&self) -> usize {
    self.write_attempts.load(Ordering::SeqCst)
  }
}

fn put<T: HasText + Clone>(existing: &mut Vec<T>, codes: Vec<T>) -> usize {
  let count = codes.len();

  for code in codes {
    match existing.iter_mut().find(|c| c.code() == code.code()) {
      Some(slot) => *slot = code,
      None => existing.push(code),
    }
  }

  count
}

impl MappingStore for MemoryStore {
  async fn health(&self) -> Result<bool, TermBridgeError> {
    Ok(self.healthy)
  }

  async fn upsert_mapping(&self, mapping: &Mapping, overwrite: bool) -> Result<Upsert, TermBridgeError> {
    self.write_attempts.fetch_add(1, Ordering::SeqCst);

    if self.fail_writes {
      return Err(TermBridgeError::OtherError(anyhow::anyhow!("writes are disabled")));
    }

    let mut state = self.state.write().await;
    let now = Timestamp::now();

    let key = (mapping.source_code.clone(), mapping.target_code.clone());

    if let Some(&position) = state.pairs.get(&key) {
      if !overwrite {
        return Ok(Upsert::Skipped);
      }

      let existing = &mut state.mappings[position];

      existing.mapping = mapping.clone();
      existing.updated_at = now;

      return Ok(Upsert::Written);
    }

    let position = state.mappings.len();

    state.pairs.insert(key, position);
    state.mappings.push(StoredMapping {
      id: position as i64 + 1,
      mapping: mapping.clone(),
      created_at: now,
      updated_at: now,
    });

    Ok(Upsert::Written)
  }

  async fn query_mappings(&self, filter: &MappingFilter) -> Result<Vec<StoredMapping>, TermBridgeError> {
    let state = self.state.read().await;

    Ok(
      state
        .mappings
        .iter()
        .filter(|m| filter.matches(&m.mapping))
        .skip(filter.offset.unwrap_or(0))
        .take(filter.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect(),
    )
  }
}

impl CodeStore for MemoryStore {
  async fn put_source_codes(&self, codes: Vec<SourceCode>) -> Result<usize, TermBridgeError> {
    Ok(put(&mut self.state.write().await.sources, codes))
  }

  async fn put_target_codes(&self, codes: Vec<TargetCode>) -> Result<usize, TermBridgeError> {
    Ok(put(&mut self.state.write().await.targets, codes))
  }

  async fn source_codes(&self) -> Result<Vec<SourceCode>, TermBridgeError> {
    Ok(self.state.read().await.sources.clone())
  }

  async fn target_codes(&self) -> Result<Vec<TargetCode>, TermBridgeError> {
    Ok(self.state.read().await.targets.clone())
  }

  async fn source_code(&self, code: &str) -> Result<Option<SourceCode>, TermBridgeError> {
    Ok(self.state.read().await.sources.iter().find(|c| c.code == code).cloned())
  }

  async fn target_code(&self, code: &str) -> Result<Option<TargetCode>, TermBridgeError> {
    Ok(self.state.read().await.targets.iter().find(|c| c.code == code).cloned())
  }
}
