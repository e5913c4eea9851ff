use std::{borrow::Cow, error::Error};

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use axum_extra::extract::QueryRejection;
use libtermbridge::prelude::*;
use serde_json::json;
use tracing::*;
use validator::ValidationErrors;

pub(crate) struct ApiError(pub StatusCode, pub String, pub Option<Vec<String>>);

#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("invalid credentials")]
  InvalidCredentials,
  #[error("missing resource")]
  ResourceNotFound,
  #[error(transparent)]
  OtherError(#[from] anyhow::Error),

  #[error("invalid configuration: {0}")]
  ConfigError(String),
  #[error("error from store: {0}")]
  StoreError(String),

  #[error("invalid query parameter")]
  InvalidQuery(#[from] QueryRejection),
  #[error("invalid payload")]
  InvalidPayload(#[from] JsonRejection),
  #[error("request failed validation")]
  ValidationFailed(#[from] ValidationErrors),
}

impl From<TermBridgeError> for AppError {
  fn from(value: TermBridgeError) -> Self {
    match value {
      TermBridgeError::ConfigError(err) => AppError::ConfigError(err),
      TermBridgeError::ResourceNotFound => AppError::ResourceNotFound,
      TermBridgeError::InvalidCode(err) => AppError::BadRequest(err),
      TermBridgeError::StoreError(err) => AppError::StoreError(err.to_string()),
      TermBridgeError::SerializationError(err) => AppError::OtherError(err.into()),
      TermBridgeError::OtherError(err) => AppError::OtherError(err),
    }
  }
}

pub(crate) fn validation_messages(errs: &ValidationErrors) -> Vec<String> {
  errs
    .field_errors()
    .into_iter()
    .flat_map(|(field, errors)| errors.iter().map(move |err| err.message.clone().map(Cow::into_owned).unwrap_or_else(|| format!("invalid value for {field}"))))
    .collect()
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    error!(error = self.source(), "{}", self.to_string());

    ApiError::from(&self).into_response()
  }
}

impl From<&AppError> for ApiError {
  fn from(value: &AppError) -> Self {
    match value {
      AppError::BadRequest(_) => ApiError(StatusCode::BAD_REQUEST, value.to_string(), None),
      AppError::InvalidCredentials => ApiError(StatusCode::UNAUTHORIZED, value.to_string(), None),
      AppError::ResourceNotFound => ApiError(StatusCode::NOT_FOUND, value.to_string(), None),
      AppError::StoreError(_) => ApiError(StatusCode::INTERNAL_SERVER_ERROR, value.to_string(), None),
      AppError::InvalidQuery(err) => ApiError(StatusCode::BAD_REQUEST, value.to_string(), Some(vec![err.to_string()])),
      AppError::InvalidPayload(JsonRejection::MissingJsonContentType(_)) => ApiError(StatusCode::UNSUPPORTED_MEDIA_TYPE, "invalid media type, expected application/json".to_string(), None),
      AppError::InvalidPayload(err) => ApiError(StatusCode::BAD_REQUEST, value.to_string(), Some(vec![err.body_text()])),
      AppError::ValidationFailed(errs) => ApiError(StatusCode::UNPROCESSABLE_ENTITY, value.to_string(), Some(validation_messages(errs))),
      AppError::OtherError(inner) if inner.is::<AppError>() => match inner.downcast_ref::<AppError>() {
        Some(inner) => inner.into(),
        _ => ApiError(StatusCode::INTERNAL_SERVER_ERROR, value.to_string(), None),
      },
      _ => ApiError(StatusCode::INTERNAL_SERVER_ERROR, value.to_string(), None),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let payload = match self.2 {
      Some(details) => json!({
          "message": self.1.to_string(),
          "details": details,
      }),
      None => json!({
          "message": self.1.to_string(),
      }),
    };

    (self.0, Json(payload)).into_response()
  }
}

/// Error rendered as a FHIR `OperationOutcome`, for use on `/fhir` routes.
#[derive(Debug)]
pub struct FhirError(pub AppError);

impl From<AppError> for FhirError {
  fn from(value: AppError) -> Self {
    FhirError(value)
  }
}

impl From<TermBridgeError> for FhirError {
  fn from(value: TermBridgeError) -> Self {
    FhirError(value.into())
  }
}

impl From<QueryRejection> for FhirError {
  fn from(value: QueryRejection) -> Self {
    FhirError(value.into())
  }
}

impl From<JsonRejection> for FhirError {
  fn from(value: JsonRejection) -> Self {
    FhirError(value.into())
  }
}

impl IntoResponse for FhirError {
  fn into_response(self) -> Response {
    error!(error = self.0.source(), "{}", self.0.to_string());

    let ApiError(status, message, details) = ApiError::from(&self.0);

    let code = match status {
      StatusCode::NOT_FOUND => "not-found",
      StatusCode::UNAUTHORIZED => "security",
      StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::UNSUPPORTED_MEDIA_TYPE => "invalid",
      _ => "exception",
    };

    let issues = std::iter::once(message)
      .chain(details.unwrap_or_default())
      .map(|diagnostics| {
        json!({
          "severity": "error",
          "code": code,
          "diagnostics": diagnostics,
        })
      })
      .collect::<Vec<_>>();

    (status, Json(json!({ "resourceType": "OperationOutcome", "issue": issues }))).into_response()
  }
}
