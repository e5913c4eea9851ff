use std::sync::{Arc, Mutex};

use axum::http::header::AUTHORIZATION;
use axum_test::TestServer;
use serde_json::json;

use crate::{
  api::{self, config::Config},
  tests::{log_writer::VecLogWriter, state},
  trace::{build_prometheus, init_tracing},
};

fn protected() -> Config {
  Config {
    api_key: Some("myapikey".into()),
    ..Default::default()
  }
}

#[tokio::test]
async fn api_invalid_credentials() {
  let server = TestServer::try_new(api::router(state(protected()).await)).unwrap();

  for path in ["/api/codes/namaste", "/api/codes/icd11", "/api/mappings/generate"] {
    let response = server.post(path).await;

    assert_eq!(response.status_code(), 401);
    response.assert_text_contains("invalid credentials");
  }

  let response = server.post("/api/codes/namaste").add_header(AUTHORIZATION, "Bearer invalidkey").await;

  assert_eq!(response.status_code(), 401);
  response.assert_text_contains("invalid credentials");
}

#[tokio::test]
async fn api_valid_credentials() {
  let server = TestServer::try_new(api::router(state(protected()).await)).unwrap();

  let response = server.post("/api/codes/namaste").add_header(AUTHORIZATION, "Bearer myapikey").await;

  assert_eq!(response.status_code(), 415);
  response.assert_json_contains(&json!({ "message": "invalid media type, expected application/json" }));

  let response = server.post("/api/mappings/generate").add_header(AUTHORIZATION, "Bearer myapikey").json(&json!({ "save_to_database": false })).await;

  response.assert_status_ok();
  response.assert_json_contains(&json!({ "stats": { "total": 2, "persisted": 0 } }));

  server.post("/api/mappings/suggest").json(&json!({ "code": "NAM01" })).await.assert_status_ok();
}

#[tokio::test]
async fn logging() {
  let buf = Arc::new(Mutex::new(Vec::default()));
  let config = Config::default();
  let guards = init_tracing(&config, VecLogWriter::new(Arc::clone(&buf)));

  let server = TestServer::try_new(api::router(state(config).await)).unwrap();

  server
    .post("/api/codes/namaste")
    .json(&json!({ "codes": [{ "code": "NAM10", "display": "Atisara" }] }))
    .await
    .assert_status_ok();

  drop(guards);

  let lines = buf.lock().unwrap();

  // Other tests may log through the same global subscriber.
  assert!(lines.iter().any(|line| line.contains(r#"action="ingest_codes""#) && line.contains("system=\"namaste\"") && line.contains("count=1")));
  assert!(
    lines
      .iter()
      .any(|line| line.contains("request_id=") && line.contains(r#"remote="-" method=POST path="/api/codes/namaste" status=200"#))
  );
}

#[tokio::test]
async fn metrics() {
  let mut state = state(Config {
    enable_prometheus: true,
    ..Default::default()
  })
  .await;

  state.prometheus = Some(build_prometheus().unwrap());

  let server = TestServer::try_new(api::router(state)).unwrap();
  let _ = server.post("/api/codes/namaste").await;
  let resp = server.get("/metrics").await;

  assert!(resp.text().contains(r#"http_requests_total{service="termbridge",status="415"}"#))
}
