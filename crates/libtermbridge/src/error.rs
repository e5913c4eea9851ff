#[derive(Debug, thiserror::Error)]
pub enum TermBridgeError {
  #[error("invalid configuration: {0}")]
  ConfigError(String),
  #[error("resource not found")]
  ResourceNotFound,
  #[error("invalid code: {0}")]
  InvalidCode(String),
  #[error(transparent)]
  StoreError(#[from] rusqlite::Error),
  #[error(transparent)]
  SerializationError(#[from] serde_json::Error),
  #[error(transparent)]
  OtherError(#[from] anyhow::Error),
}
