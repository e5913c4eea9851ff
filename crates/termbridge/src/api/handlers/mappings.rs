use axum::{
  Json,
  extract::{Path, State},
};
use axum_extra::extract::{Query, WithRejection};
use libtermbridge::prelude::*;
use tracing::instrument;

use crate::api::{
  AppState,
  dto::{GeneratePayload, MappingsResponse, SuggestPayload, SuggestResponse, SystemParams},
  errors::AppError,
  middlewares::{auth::Auth, json_rejection::TypedJson},
};

#[instrument(skip_all)]
pub async fn translate_code<S: Store>(
  State(state): State<AppState<S>>,
  Path(code): Path<String>,
  WithRejection(Query(params), _): WithRejection<Query<SystemParams>, AppError>,
) -> Result<Json<Translation>, AppError> {
  Ok(Json(state.termbridge.translate(params.system()?, &code).await?))
}

#[instrument(skip_all)]
pub async fn list_mappings<S: Store>(
  State(state): State<AppState<S>>,
  WithRejection(Query(filter), _): WithRejection<Query<MappingFilter>, AppError>,
) -> Result<Json<MappingsResponse>, AppError> {
  let mappings = state.termbridge.mappings(&filter).await?;

  Ok(Json(MappingsResponse { total: mappings.len(), mappings }))
}

#[instrument(skip_all)]
pub async fn suggest<S: Store>(State(state): State<AppState<S>>, TypedJson(payload): TypedJson<SuggestPayload>) -> Result<Json<SuggestResponse>, AppError> {
  let matches = state.termbridge.suggest(&payload.code, payload.max_results).await?;

  Ok(Json(SuggestResponse {
    code: payload.code,
    total: matches.len(),
    matches,
  }))
}

#[instrument(skip_all)]
pub async fn generate<S: Store>(State(state): State<AppState<S>>, _: Auth<S>, TypedJson(payload): TypedJson<GeneratePayload>) -> Result<Json<GenerationReport>, AppError> {
  let options = payload.options(state.config.max_matches_per_code);

  tracing::info!(
    target: "audit",
    action = "generate_mappings",
    max_matches_per_code = options.max_matches_per_code,
    save_to_database = options.save_to_database,
    overwrite_existing = options.overwrite_existing,
    "mapping generation requested"
  );

  let report = state.termbridge.generate(&options).await?;

  if report.stats.failed > 0 {
    tracing::warn!(failed = report.stats.failed, total = report.stats.total, "some mappings could not be persisted");
  }

  Ok(Json(report))
}
