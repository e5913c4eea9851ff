use std::{
  env::{self, VarError},
  fmt::Display,
  path::PathBuf,
  str::FromStr,
  time::Duration,
};

use libtermbridge::prelude::*;

use crate::api::errors::AppError;

pub const MAX_MATCHES_LIMIT: usize = 50;

#[derive(Clone, Debug)]
pub struct Config {
  pub env: Env,
  pub listen_addr: String,
  pub api_key: Option<String>,

  // Storage
  pub database_path: String,
  pub seed_namaste_path: Option<PathBuf>,
  pub seed_icd11_path: Option<PathBuf>,

  // Matching
  pub thresholds: Thresholds,
  pub max_matches_per_code: usize,

  pub request_timeout: Duration,
  pub enable_prometheus: bool,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      env: Env::Dev,
      listen_addr: "0.0.0.0:8000".into(),
      api_key: None,
      database_path: ":memory:".into(),
      seed_namaste_path: None,
      seed_icd11_path: None,
      thresholds: Thresholds::default(),
      max_matches_per_code: 3,
      request_timeout: Duration::from_secs(30),
      enable_prometheus: false,
    }
  }
}

impl Config {
  pub fn from_env() -> Result<Config, AppError> {
    let config = Config {
      env: Env::from(env::var("ENV").unwrap_or("dev".into())),
      listen_addr: env::var("LISTEN_ADDR").unwrap_or("0.0.0.0:8000".into()),
      api_key: env::var("API_KEY").ok().filter(|key| !key.is_empty()),
      database_path: env::var("DATABASE_PATH").ok().filter(|path| !path.is_empty()).unwrap_or("termbridge.db".into()),
      seed_namaste_path: env::var("SEED_NAMASTE_PATH").ok().filter(|path| !path.is_empty()).map(PathBuf::from),
      seed_icd11_path: env::var("SEED_ICD11_PATH").ok().filter(|path| !path.is_empty()).map(PathBuf::from),
      thresholds: Thresholds {
        similarity: parse_env("SIMILARITY_THRESHOLD", DEFAULT_SIMILARITY_THRESHOLD)?,
        high_confidence: parse_env("HIGH_CONFIDENCE_THRESHOLD", DEFAULT_HIGH_CONFIDENCE_THRESHOLD)?,
      },
      max_matches_per_code: parse_env("MAX_MATCHES_PER_CODE", 3)?,
      request_timeout: Duration::from_secs(parse_env("REQUEST_TIMEOUT", 30)?),
      enable_prometheus: env::var("ENABLE_PROMETHEUS").unwrap_or_default() == "1",
    };

    config.thresholds.validate()?;

    if !(1..=MAX_MATCHES_LIMIT).contains(&config.max_matches_per_code) {
      return Err(AppError::ConfigError(format!("MAX_MATCHES_PER_CODE must be between 1 and {MAX_MATCHES_LIMIT}")));
    }
    if config.request_timeout.is_zero() {
      return Err(AppError::ConfigError("REQUEST_TIMEOUT cannot be zero".into()));
    }

    Ok(config)
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Env {
  Dev,
  Production,
}

impl From<String> for Env {
  fn from(value: String) -> Self {
    match value.as_ref() {
      "dev" => Env::Dev,
      "production" => Env::Production,
      _ => Env::Dev,
    }
  }
}

pub fn parse_env<T>(name: &str, default: T) -> Result<T, AppError>
where
  T: FromStr,
  T::Err: Display,
{
  match env::var(name) {
    Ok(value) if value.is_empty() => Ok(default),
    Ok(value) => value.parse::<T>().map_err(|err| AppError::ConfigError(format!("could not read {name}: {err}"))),
    Err(err) => match err {
      VarError::NotPresent => Ok(default),
      _ => Err(AppError::ConfigError(format!("could not read {name}: {err}"))),
    },
  }
}
