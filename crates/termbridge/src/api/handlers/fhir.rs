use axum::{
  Json,
  extract::{Path, State},
};
use axum_extra::extract::{Query, WithRejection};
use libtermbridge::prelude::*;
use serde_json::Value;
use tracing::instrument;

use crate::api::{
  AppState,
  dto::{CodingParams, Parameters},
  errors::{AppError, FhirError},
  fhir,
};

pub async fn capability_statement() -> Json<Value> {
  Json(fhir::capability_statement(env!("CARGO_PKG_VERSION")))
}

#[instrument(skip_all)]
pub async fn code_system<S: Store>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<Value>, FhirError> {
  let system = id.parse::<CodeSystem>().map_err(|_| AppError::ResourceNotFound)?;
  let entries = state.termbridge.codes(system).await?;

  Ok(Json(fhir::code_system(system, &entries)))
}

#[instrument(skip_all)]
pub async fn lookup<S: Store>(State(state): State<AppState<S>>, WithRejection(Query(params), _): WithRejection<Query<CodingParams>, FhirError>) -> Result<Json<Value>, FhirError> {
  let (system, code) = params.coding()?;
  let entry = state.termbridge.lookup(system, code).await?;

  Ok(Json(fhir::lookup(&entry)))
}

#[instrument(skip_all)]
pub async fn translate<S: Store>(State(state): State<AppState<S>>, WithRejection(Query(params), _): WithRejection<Query<CodingParams>, FhirError>) -> Result<Json<Value>, FhirError> {
  translate_coding(&state, &params).await
}

#[instrument(skip_all)]
pub async fn translate_parameters<S: Store>(State(state): State<AppState<S>>, WithRejection(Json(body), _): WithRejection<Json<Parameters>, FhirError>) -> Result<Json<Value>, FhirError> {
  translate_coding(&state, &CodingParams::from(body)).await
}

async fn translate_coding<S: Store>(state: &AppState<S>, params: &CodingParams) -> Result<Json<Value>, FhirError> {
  let (system, code) = params.coding()?;
  let translation = state.termbridge.translate(system, code).await?;

  Ok(Json(fhir::translate(&translation)))
}

#[instrument(skip_all)]
pub async fn concept_map<S: Store>(State(state): State<AppState<S>>) -> Result<Json<Value>, FhirError> {
  let mappings = state.termbridge.mappings(&MappingFilter::default()).await?;

  Ok(Json(fhir::concept_map(&mappings)))
}
