use axum::{Json, extract::State};
use axum_extra::extract::{Query, WithRejection};
use libtermbridge::prelude::*;
use tracing::instrument;
use validator::Validate;

use crate::api::{
  AppState,
  dto::{Icd11Batch, IngestResponse, NamasteBatch, SearchParams, SearchResponse},
  errors::AppError,
  middlewares::{auth::Auth, json_rejection::TypedJson},
};

#[instrument(skip_all)]
pub async fn search<S: Store>(
  State(state): State<AppState<S>>,
  WithRejection(Query(params), _): WithRejection<Query<SearchParams>, AppError>,
) -> Result<Json<SearchResponse>, AppError> {
  params.validate()?;

  let system = params.system()?;
  let results = state.termbridge.search(system, &params.q, params.limit).await?;

  Ok(Json(SearchResponse {
    query: params.q,
    system,
    total: results.len(),
    results,
  }))
}

#[instrument(skip_all)]
pub async fn ingest_namaste<S: Store>(State(state): State<AppState<S>>, _: Auth<S>, TypedJson(batch): TypedJson<NamasteBatch>) -> Result<Json<IngestResponse>, AppError> {
  let ingested = state.termbridge.ingest_source_codes(batch.codes).await?;

  tracing::info!(target: "audit", action = "ingest_codes", system = CodeSystem::Namaste.id(), count = ingested, "codes ingested");

  Ok(Json(IngestResponse {
    system: CodeSystem::Namaste,
    ingested,
  }))
}

#[instrument(skip_all)]
pub async fn ingest_icd11<S: Store>(State(state): State<AppState<S>>, _: Auth<S>, TypedJson(batch): TypedJson<Icd11Batch>) -> Result<Json<IngestResponse>, AppError> {
  let ingested = state.termbridge.ingest_target_codes(batch.codes).await?;

  tracing::info!(target: "audit", action = "ingest_codes", system = CodeSystem::Icd11.id(), count = ingested, "codes ingested");

  Ok(Json(IngestResponse { system: CodeSystem::Icd11, ingested }))
}
