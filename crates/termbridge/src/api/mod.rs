use std::path::Path;

use anyhow::Context;
use axum::{
  Router, middleware,
  routing::{get, post},
};
use libtermbridge::prelude::*;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::de::DeserializeOwned;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{api::config::Config, trace::build_prometheus};

pub mod config;
pub mod dto;
pub mod errors;
pub mod fhir;

pub mod handlers;
mod middlewares;

#[derive(Clone)]
pub struct AppState<S: Store> {
  pub config: Config,
  pub prometheus: Option<PrometheusHandle>,
  pub termbridge: TermBridge<S>,
}

pub async fn routes<S: Store>(config: &Config, store: S) -> anyhow::Result<Router> {
  let termbridge = TermBridge::new(store).thresholds(config.thresholds).build()?;

  if let Some(path) = &config.seed_namaste_path {
    let count = termbridge.ingest_source_codes(read_seed(path).await?).await?;

    tracing::info!(path = %path.display(), count, "seeded NAMASTE codes");
  }

  if let Some(path) = &config.seed_icd11_path {
    let count = termbridge.ingest_target_codes(read_seed(path).await?).await?;

    tracing::info!(path = %path.display(), count, "seeded ICD-11 codes");
  }

  let prometheus = match config.enable_prometheus {
    true => Some(build_prometheus()?),
    false => None,
  };

  let state = AppState {
    config: config.clone(),
    prometheus,
    termbridge,
  };

  Ok(router(state))
}

async fn read_seed<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
  let contents = tokio::fs::read(path).await.with_context(|| format!("could not read seed file {}", path.display()))?;

  serde_json::from_slice(&contents).with_context(|| format!("could not parse seed file {}", path.display()))
}

pub fn router<S: Store>(state: AppState<S>) -> Router {
  let fhir = Router::new()
    .route("/metadata", get(handlers::capability_statement))
    .route("/CodeSystem/$lookup", get(handlers::lookup::<S>))
    .route("/CodeSystem/{id}", get(handlers::code_system::<S>))
    .route("/ConceptMap/$translate", get(handlers::translate::<S>).post(handlers::translate_parameters::<S>))
    .route("/ConceptMap/namaste-to-icd11", get(handlers::concept_map::<S>));

  let api = Router::new()
    .route("/search", get(handlers::search::<S>))
    .route("/translate/{code}", get(handlers::translate_code::<S>))
    .route("/mappings", get(handlers::list_mappings::<S>))
    .route("/mappings/suggest", post(handlers::suggest::<S>))
    .route("/mappings/generate", post(handlers::generate::<S>))
    .route("/codes/namaste", post(handlers::ingest_namaste::<S>))
    .route("/codes/icd11", post(handlers::ingest_icd11::<S>));

  Router::new()
    .nest("/fhir", fhir)
    .nest("/api", api)
    .fallback(handlers::not_found)
    .layer(TimeoutLayer::new(state.config.request_timeout))
    .layer(middleware::from_fn(middlewares::metrics))
    .layer(TraceLayer::new_for_http().make_span_with(middlewares::create_request_span))
    // The routes below will not go through the observability middlewares above
    .route("/healthz", get(handlers::healthz))
    .route("/readyz", get(handlers::readyz::<S>))
    .route("/metrics", get(handlers::prometheus::<S>))
    .layer(middleware::from_fn(middlewares::logging::api_logger))
    .layer(middleware::from_fn(middlewares::request_id))
    .with_state(state)
}
