pub mod mock;
pub mod sqlite;

use crate::{
  error::TermBridgeError,
  model::{Mapping, MappingFilter, SourceCode, StoredMapping, TargetCode},
};

/// Outcome of a mapping write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Upsert {
  Written,
  /// The pair already existed and overwriting was not requested.
  Skipped,
}

/// Persistence for generated mappings, keyed by `(source_code, target_code)`.
#[allow(async_fn_in_trait)]
pub trait MappingStore: Clone + Send + Sync + 'static {
  fn health(&self) -> impl Future<Output = Result<bool, TermBridgeError>> + Send;

  /// Insert a mapping. With `overwrite`, an existing mapping for the same
  /// pair is replaced, otherwise the write is a no-op.
  fn upsert_mapping(&self, mapping: &Mapping, overwrite: bool) -> impl Future<Output = Result<Upsert, TermBridgeError>> + Send;
  fn query_mappings(&self, filter: &MappingFilter) -> impl Future<Output = Result<Vec<StoredMapping>, TermBridgeError>> + Send;
}

/// Persistence for the code records of both terminologies.
#[allow(async_fn_in_trait)]
pub trait CodeStore: Clone + Send + Sync + 'static {
  fn put_source_codes(&self, codes: Vec<SourceCode>) -> impl Future<Output = Result<usize, TermBridgeError>> + Send;
  fn put_target_codes(&self, codes: Vec<TargetCode>) -> impl Future<Output = Result<usize, TermBridgeError>> + Send;
  fn source_codes(&self) -> impl Future<Output = Result<Vec<SourceCode>, TermBridgeError>> + Send;
  fn target_codes(&self) -> impl Future<Output = Result<Vec<TargetCode>, TermBridgeError>> + Send;
  fn source_code(&self, code: &str) -> impl Future<Output = Result<Option<SourceCode>, TermBridgeError>> + Send;
  fn target_code(&self, code: &str) -> impl Future<Output = Result<Option<TargetCode>, TermBridgeError>> + Send;
}

pub trait Store: MappingStore + CodeStore {}

impl<T: MappingStore + CodeStore> Store for T {}
