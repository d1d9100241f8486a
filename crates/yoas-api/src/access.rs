use axum::{extract::FromRequestParts, extract::Query, http::request::Parts};
use serde::Deserialize;

use crate::AppState;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct AccessKeyParams {
    access_key: Option<String>,
}

/// Proof that the request carried the shared `access_key` query parameter.
///
/// Put it first in a handler's argument list: it then runs before body and
/// query extraction, so a bad key is answered with 403 whatever the payload.
#[derive(Debug, Clone, Copy)]
pub struct AccessGranted;

impl FromRequestParts<AppState> for AccessGranted {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let supplied = Query::<AccessKeyParams>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(params)| params.access_key);

        match supplied {
            Some(key) if key == state.access_key => Ok(AccessGranted),
            _ => Err(AppError::Forbidden),
        }
    }
}
