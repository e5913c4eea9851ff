mod codes;
mod fhir;
mod mappings;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use libtermbridge::prelude::*;

use crate::api::{AppState, errors::AppError};

pub(super) use self::codes::{ingest_icd11, ingest_namaste, search};
pub(super) use self::fhir::{capability_statement, code_system, concept_map, lookup, translate, translate_parameters};
pub(super) use self::mappings::{generate, list_mappings, suggest, translate_code};

pub async fn not_found() -> impl IntoResponse {
  AppError::ResourceNotFound
}

pub async fn healthz() -> StatusCode {
  StatusCode::OK
}

pub async fn readyz<S: Store>(State(state): State<AppState<S>>) -> StatusCode {
  match state.termbridge.health().await {
    Ok(true) => StatusCode::OK,

    Ok(false) => StatusCode::SERVICE_UNAVAILABLE,

    Err(err) => {
      tracing::warn!(error = err.to_string(), "store health check failed");

      StatusCode::SERVICE_UNAVAILABLE
    }
  }
}

pub async fn prometheus<S: Store>(State(state): State<AppState<S>>) -> Result<String, AppError> {
  match state.prometheus {
    Some(handle) => Ok(handle.render()),
    None => Err(AppError::ResourceNotFound),
  }
}
