use std::marker::PhantomData;

use anyhow::Context;
use axum::{
  RequestPartsExt,
  extract::{FromRef, FromRequestParts},
  http::request::Parts,
};
use axum_extra::{
  TypedHeader,
  headers::{Authorization, authorization::Bearer},
};
use libtermbridge::prelude::*;

use crate::api::{AppState, errors::AppError};

/// Guard for mutating endpoints.
///
/// Passes through when no API key is configured, otherwise requires a
/// matching bearer token.
#[non_exhaustive]
pub(crate) struct Auth<S> {
  _marker: PhantomData<S>,
}

impl<St, S> FromRequestParts<St> for Auth<S>
where
  S: Store,
  St: Send + Sync,
  AppState<S>: FromRef<St>,
{
  type Rejection = AppError;

  async fn from_request_parts(parts: &mut Parts, state: &St) -> Result<Self, Self::Rejection> {
    let app_state = AppState::<S>::from_ref(state);

    let Some(api_key) = app_state.config.api_key else {
      return Ok(Auth { _marker: PhantomData });
    };

    let header = parts
      .extract::<TypedHeader<Authorization<Bearer>>>()
      .await
      .context("no authorization header found")
      .context(AppError::InvalidCredentials)?;

    if header.token() != api_key {
      tracing::warn!(target: "audit", path = parts.uri.path(), "rejected invalid api key");

      return Err(AppError::InvalidCredentials);
    }

    Ok(Auth { _marker: PhantomData })
  }
}
