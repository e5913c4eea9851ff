use libtermbridge::prelude::*;
use serde::{Deserialize, Serialize};
use serde_inline_default::serde_inline_default;
use validator::Validate;

use crate::api::errors::AppError;

fn parse_system(system: Option<&str>) -> Result<CodeSystem, AppError> {
  match system {
    Some(system) => Ok(system.parse()?),
    None => Ok(CodeSystem::Namaste),
  }
}

#[serde_inline_default]
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct SearchParams {
  #[validate(length(min = 1, message = "search query cannot be empty"))]
  pub q: String,
  pub system: Option<String>,
  #[serde_inline_default(10)]
  #[validate(range(min = 1, max = 50, message = "limit must be between 1 and 50"))]
  pub limit: usize,
}

impl SearchParams {
  pub fn system(&self) -> Result<CodeSystem, AppError> {
    parse_system(self.system.as_deref())
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SystemParams {
  pub system: Option<String>,
}

impl SystemParams {
  pub fn system(&self) -> Result<CodeSystem, AppError> {
    parse_system(self.system.as_deref())
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CodingParams {
  pub system: Option<String>,
  pub code: Option<String>,
}

impl CodingParams {
  pub fn coding(&self) -> Result<(CodeSystem, &str), AppError> {
    let code = self.code.as_deref().filter(|code| !code.trim().is_empty()).ok_or_else(|| AppError::BadRequest("a code is required".into()))?;

    Ok((parse_system(self.system.as_deref())?, code))
  }
}

/// Minimal FHIR `Parameters` resource, as posted to `$translate`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
  #[serde(default)]
  pub parameter: Vec<Parameter>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
  pub name: String,
  pub value_uri: Option<String>,
  pub value_code: Option<String>,
  pub value_string: Option<String>,
}

impl Parameters {
  fn value(&self, name: &str) -> Option<String> {
    self
      .parameter
      .iter()
      .find(|param| param.name == name)
      .and_then(|param| param.value_uri.clone().or_else(|| param.value_code.clone()).or_else(|| param.value_string.clone()))
  }
}

impl From<Parameters> for CodingParams {
  fn from(value: Parameters) -> Self {
    CodingParams {
      system: value.value("system"),
      code: value.value("code"),
    }
  }
}

#[serde_inline_default]
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct SuggestPayload {
  #[validate(length(min = 1, message = "a source code is required"))]
  pub code: String,
  #[serde_inline_default(DEFAULT_MAX_RESULTS)]
  #[validate(range(min = 1, max = 50, message = "max_results must be between 1 and 50"))]
  pub max_results: usize,
}

#[serde_inline_default]
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct GeneratePayload {
  #[validate(range(min = 1, max = 50, message = "max_matches_per_code must be between 1 and 50"))]
  pub max_matches_per_code: Option<usize>,
  #[serde_inline_default(true)]
  pub save_to_database: bool,
  #[serde_inline_default(false)]
  pub overwrite_existing: bool,
}

impl GeneratePayload {
  pub fn options(&self, default_max: usize) -> GenerateOptions {
    GenerateOptions {
      max_matches_per_code: self.max_matches_per_code.unwrap_or(default_max),
      save_to_database: self.save_to_database,
      overwrite_existing: self.overwrite_existing,
    }
  }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct NamasteBatch {
  #[validate(length(min = 1, message = "at least one code must be provided"))]
  pub codes: Vec<SourceCode>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct Icd11Batch {
  #[validate(length(min = 1, message = "at least one code must be provided"))]
  pub codes: Vec<TargetCode>,
}

#[derive(Serialize)]
pub struct SearchResponse {
  pub query: String,
  pub system: CodeSystem,
  pub total: usize,
  pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SuggestResponse {
  pub code: String,
  pub total: usize,
  pub matches: Vec<Mapping>,
}

#[derive(Serialize)]
pub struct MappingsResponse {
  pub total: usize,
  pub mappings: Vec<StoredMapping>,
}

#[derive(Serialize)]
pub struct IngestResponse {
  pub system: CodeSystem,
  pub ingested: usize,
}

#[cfg(test)]
mod tests {
  use libtermbridge::prelude::*;
  use validator::Validate;

  use super::{CodingParams, GeneratePayload, Parameters, SearchParams, SuggestPayload};

  #[test]
  fn search_params() {
    let params: SearchParams = serde_json::from_str(r#"{"q": "fever"}"#).unwrap();

    assert_eq!(params.limit, 10);
    assert!(params.validate().is_ok());
    assert_eq!(params.system().unwrap(), CodeSystem::Namaste);

    let params: SearchParams = serde_json::from_str(r#"{"q": "", "limit": 51, "system": "snomed"}"#).unwrap();
    let errs = params.validate().unwrap_err();

    assert_eq!(errs.field_errors().len(), 2);
    assert!(params.system().is_err());
  }

  #[test]
  fn suggest_payload() {
    let payload: SuggestPayload = serde_json::from_str(r#"{"code": "SR11"}"#).unwrap();

    assert_eq!(payload.max_results, 5);
    assert!(payload.validate().is_ok());

    let payload: SuggestPayload = serde_json::from_str(r#"{"code": "SR11", "max_results": 0}"#).unwrap();

    assert!(payload.validate().is_err());
  }

  #[test]
  fn generate_payload() {
    let payload: GeneratePayload = serde_json::from_str("{}").unwrap();
    let options = payload.options(3);

    assert_eq!(options, GenerateOptions::default());

    let payload: GeneratePayload = serde_json::from_str(r#"{"max_matches_per_code": 60}"#).unwrap();

    assert!(payload.validate().is_err());
  }

  #[test]
  fn parameters_body() {
    let body: Parameters = serde_json::from_str(
      r#"{
        "resourceType": "Parameters",
        "parameter": [
          { "name": "system", "valueUri": "http://id.who.int/icd/release/11/mms" },
          { "name": "code", "valueCode": "SM10" }
        ]
      }"#,
    )
    .unwrap();

    let params = CodingParams::from(body);
    let (system, code) = params.coding().unwrap();

    assert_eq!(system, CodeSystem::Icd11);
    assert_eq!(code, "SM10");
  }

  #[test]
  fn missing_code() {
    let params = CodingParams { system: None, code: Some(" ".into()) };

    assert!(params.coding().is_err());
  }
}
