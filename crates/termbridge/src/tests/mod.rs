use libtermbridge::prelude::*;

use crate::api::{AppState, config::Config};

mod api;
mod middlewares;

pub(crate) fn source_codes() -> Vec<SourceCode> {
  vec![
    SourceCode::builder("NAM01").display("gastro-intestinal disorder").system_name("Ayurveda").build(),
    SourceCode::builder("NAM02").display("headache").system_name("Siddha").build(),
    SourceCode::builder("NAM03").display("Jwara").namc_term("jvaraH").system_name("Ayurveda").build(),
  ]
}

pub(crate) fn target_codes() -> Vec<TargetCode> {
  vec![
    TargetCode::builder("SM10").display("Gastro-intestinal disorders").chapter("26").build(),
    TargetCode::builder("SK00").display("Head, brain, nerve disorders").definition("Disorders of the nervous system").chapter("26").build(),
    TargetCode::builder("8A80").title("Headache disorders").chapter("08").build(),
  ]
}

pub(crate) async fn state_with(config: Config, store: MemoryStore) -> AppState<MemoryStore> {
  let termbridge = TermBridge::new(store).thresholds(config.thresholds).build().unwrap();

  termbridge.ingest_source_codes(source_codes()).await.unwrap();
  termbridge.ingest_target_codes(target_codes()).await.unwrap();

  AppState {
    config,
    prometheus: None,
    termbridge,
  }
}

pub(crate) async fn state(config: Config) -> AppState<MemoryStore> {
  state_with(config, MemoryStore::default()).await
}
