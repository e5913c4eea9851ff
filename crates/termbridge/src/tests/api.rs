use axum_test::TestServer;
use libtermbridge::prelude::*;
use serde_json::json;

use crate::{
  api::{self, config::Config},
  tests::{state, state_with},
};

async fn server() -> TestServer {
  TestServer::try_new(api::router(state(Config::default()).await)).unwrap()
}

#[tokio::test]
async fn health() {
  let server = server().await;

  server.get("/healthz").await.assert_status_ok();
  server.get("/readyz").await.assert_status_ok();

  let unhealthy = state_with(Config::default(), MemoryStore::builder().healthy(false).build()).await;
  let server = TestServer::try_new(api::router(unhealthy)).unwrap();

  assert_eq!(server.get("/readyz").await.status_code(), 503);
}

#[tokio::test]
async fn not_found() {
  let server = server().await;
  let response = server.get("/nothing/here").await;

  assert_eq!(response.status_code(), 404);
  response.assert_json_contains(&json!({ "message": "missing resource" }));

  assert_eq!(server.get("/metrics").await.status_code(), 404);
}

#[tokio::test]
async fn search_codes() {
  let server = server().await;
  let response = server.get("/api/search").add_query_param("q", "headache").add_query_param("system", "icd11").await;

  response.assert_status_ok();
  response.assert_json_contains(&json!({
      "query": "headache",
      "system": "icd11",
      "total": 3,
  }));

  let body = response.json::<serde_json::Value>();

  assert_eq!(body["results"][0]["code"], "8A80");
  assert_eq!(body["results"][0]["confidence"], "medium");
  assert_eq!(body["results"][2]["confidence"], "low");

  let response = server.get("/api/search").add_query_param("q", "headache").add_query_param("limit", "1").await;
  let body = response.json::<serde_json::Value>();

  assert_eq!(body["system"], "namaste");
  assert_eq!(body["total"], 1);
  assert_eq!(body["results"][0]["code"], "NAM02");
}

#[tokio::test]
async fn search_validation() {
  let server = server().await;

  let response = server.get("/api/search").add_query_param("q", "").await;

  assert_eq!(response.status_code(), 422);
  response.assert_json_contains(&json!({ "details": ["search query cannot be empty"] }));

  let response = server.get("/api/search").add_query_param("q", "fever").add_query_param("limit", "100").await;

  assert_eq!(response.status_code(), 422);

  let response = server.get("/api/search").add_query_param("q", "fever").add_query_param("system", "snomed").await;

  assert_eq!(response.status_code(), 400);

  let response = server.get("/api/search").add_query_param("q", "fever").add_query_param("limit", "many").await;

  assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn ingest_codes() {
  let server = server().await;

  let response = server
    .post("/api/codes/namaste")
    .json(&json!({
        "codes": [
            { "code": "NAM04", "display": "Kasa", "nameEnglish": "Cough", "namcTerm": "kAsaH" }
        ]
    }))
    .await;

  response.assert_status_ok();
  response.assert_json_contains(&json!({ "system": "namaste", "ingested": 1 }));

  let response = server.post("/api/codes/icd11").json(&json!({ "codes": [{ "code": "MD12", "title": "Cough", "longDefinition": "A sudden expulsion of air" }] })).await;

  response.assert_json_contains(&json!({ "system": "icd11", "ingested": 1 }));

  let response = server.post("/api/codes/icd11").json(&json!({ "codes": [] })).await;

  assert_eq!(response.status_code(), 422);
  response.assert_json_contains(&json!({ "details": ["at least one code must be provided"] }));

  let response = server.post("/api/codes/icd11").json(&json!({ "codes": [{ "code": "" }] })).await;

  assert_eq!(response.status_code(), 400);

  let response = server.get("/fhir/CodeSystem/$lookup").add_query_param("system", "namaste").add_query_param("code", "NAM04").await;

  response.assert_status_ok();

  let body = response.json::<serde_json::Value>();
  let parameters = body["parameter"].as_array().unwrap();

  assert_eq!(body["resourceType"], "Parameters");
  assert_eq!(parameters.len(), 4);
  assert_eq!(parameters[0], json!({ "name": "name", "valueString": "NAMASTE" }));
  assert_eq!(parameters[1], json!({ "name": "display", "valueString": "Kasa" }));
  assert_eq!(parameters[2]["part"][1]["valueString"], "Cough");
  assert_eq!(parameters[3]["part"][1]["valueString"], "kAsaH");
}

#[tokio::test]
async fn suggest_mappings() {
  let server = server().await;

  let response = server.post("/api/mappings/suggest").json(&json!({ "code": "NAM02" })).await;

  response.assert_status_ok();
  response.assert_json_contains(&json!({
      "code": "NAM02",
      "total": 1,
      "matches": [
          { "source_code": "NAM02", "target_code": "8A80", "confidence": "medium", "equivalence": "relatedto" }
      ]
  }));

  assert_eq!(server.post("/api/mappings/suggest").json(&json!({ "code": "NAM02", "max_results": 0 })).await.status_code(), 422);
  assert_eq!(server.post("/api/mappings/suggest").json(&json!({ "code": "NAM99" })).await.status_code(), 404);

  let response = server.get("/api/mappings").await;

  response.assert_json_contains(&json!({ "total": 0 }));
}

#[tokio::test]
async fn generate_and_query() {
  let server = server().await;
  let response = server.post("/api/mappings/generate").json(&json!({})).await;

  response.assert_status_ok();
  response.assert_json_contains(&json!({
      "stats": { "total": 2, "high": 1, "medium": 1, "persisted": 2, "skipped": 0, "failed": 0 },
      "high": [{ "source_code": "NAM01", "target_code": "SM10" }],
      "medium": [{ "source_code": "NAM02", "target_code": "8A80" }],
  }));

  let response = server.post("/api/mappings/generate").json(&json!({})).await;

  response.assert_json_contains(&json!({ "stats": { "persisted": 0, "skipped": 2 } }));

  let response = server.get("/api/mappings").add_query_param("confidence", "high").await;

  response.assert_json_contains(&json!({ "total": 1, "mappings": [{ "id": 1, "source_code": "NAM01", "target_code": "SM10" }] }));

  let response = server.get("/api/mappings").add_query_param("min_score", "0.5").add_query_param("limit", "1").add_query_param("offset", "1").await;

  response.assert_json_contains(&json!({ "total": 1, "mappings": [{ "source_code": "NAM02" }] }));

  let response = server.get("/api/translate/NAM01").await;

  response.assert_json_contains(&json!({ "system": "namaste", "code": "NAM01", "mappings": [{ "target_code": "SM10" }] }));

  let response = server.get("/api/translate/8A80").add_query_param("system", "icd11").await;

  response.assert_json_contains(&json!({ "system": "icd11", "mappings": [{ "source_code": "NAM02" }] }));

  assert_eq!(server.post("/api/mappings/generate").json(&json!({ "max_matches_per_code": 0 })).await.status_code(), 422);
}

#[tokio::test]
async fn fhir_metadata_and_code_systems() {
  let server = server().await;

  server.get("/fhir/metadata").await.assert_json_contains(&json!({ "resourceType": "CapabilityStatement", "fhirVersion": "4.0.1" }));

  let response = server.get("/fhir/CodeSystem/icd11").await;

  response.assert_json_contains(&json!({
      "resourceType": "CodeSystem",
      "url": ICD11_SYSTEM,
      "count": 3,
      "concept": [
          { "code": "SM10", "display": "Gastro-intestinal disorders" },
          { "code": "SK00", "definition": "Disorders of the nervous system" },
          { "code": "8A80", "display": "Headache disorders" },
      ]
  }));

  let response = server.get("/fhir/CodeSystem/snomed").await;

  assert_eq!(response.status_code(), 404);
  response.assert_json_contains(&json!({ "resourceType": "OperationOutcome", "issue": [{ "severity": "error", "code": "not-found" }] }));
}

#[tokio::test]
async fn fhir_lookup_errors() {
  let server = server().await;

  let response = server.get("/fhir/CodeSystem/$lookup").add_query_param("system", NAMASTE_SYSTEM).add_query_param("code", "NAM99").await;

  assert_eq!(response.status_code(), 404);
  response.assert_json_contains(&json!({ "resourceType": "OperationOutcome" }));

  let response = server.get("/fhir/CodeSystem/$lookup").add_query_param("system", NAMASTE_SYSTEM).await;

  assert_eq!(response.status_code(), 400);
  response.assert_json_contains(&json!({ "resourceType": "OperationOutcome", "issue": [{ "code": "invalid" }] }));
}

#[tokio::test]
async fn fhir_translate() {
  let server = server().await;

  let response = server.get("/fhir/ConceptMap/$translate").add_query_param("system", NAMASTE_SYSTEM).add_query_param("code", "NAM01").await;

  response.assert_json_contains(&json!({
      "resourceType": "Parameters",
      "parameter": [
          { "name": "result", "valueBoolean": false },
          { "name": "message", "valueString": "no mapping found for code NAM01" },
      ]
  }));

  server.post("/api/mappings/generate").json(&json!({})).await.assert_status_ok();

  let response = server.get("/fhir/ConceptMap/$translate").add_query_param("system", NAMASTE_SYSTEM).add_query_param("code", "NAM01").await;

  response.assert_json_contains(&json!({
      "resourceType": "Parameters",
      "parameter": [
          { "name": "result", "valueBoolean": true },
          {
              "name": "match",
              "part": [
                  { "name": "equivalence", "valueCode": "equivalent" },
                  { "name": "concept", "valueCoding": { "system": ICD11_SYSTEM, "code": "SM10", "display": "Gastro-intestinal disorders" } },
                  { "name": "source" },
              ]
          }
      ]
  }));

  let response = server
    .post("/fhir/ConceptMap/$translate")
    .json(&json!({
        "resourceType": "Parameters",
        "parameter": [
            { "name": "system", "valueUri": ICD11_SYSTEM },
            { "name": "code", "valueCode": "8A80" }
        ]
    }))
    .await;

  response.assert_json_contains(&json!({
      "parameter": [
          { "name": "result", "valueBoolean": true },
          { "name": "match", "part": [{ "valueCode": "relatedto" }, { "valueCoding": { "system": NAMASTE_SYSTEM, "code": "NAM02" } }, { "name": "source" }] }
      ]
  }));

  let response = server.get("/fhir/ConceptMap/namaste-to-icd11").await;

  response.assert_json_contains(&json!({
      "resourceType": "ConceptMap",
      "group": [{
          "source": NAMASTE_SYSTEM,
          "target": ICD11_SYSTEM,
          "element": [
              { "code": "NAM01", "target": [{ "code": "SM10", "equivalence": "equivalent" }] },
              { "code": "NAM02", "target": [{ "code": "8A80", "equivalence": "relatedto" }] },
          ]
      }]
  }));
}
