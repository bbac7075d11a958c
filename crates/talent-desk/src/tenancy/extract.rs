//! Request extractors that reject with the structured error body instead of axum's plain text.

use std::str::FromStr;

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ServiceError;
use super::validation::ValidationError;

/// JSON body; syntax and shape errors become a 400 [`ValidationError::Malformed`].
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ValidationError::Malformed(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string filter.
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ValidationError::Malformed(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Parse a path segment into a typed id.
pub fn parse_id<I: FromStr>(entity: &'static str, raw: &str) -> Result<I, ServiceError> {
    raw.parse::<I>().map_err(|_| {
        ValidationError::invalid("id", format!("'{raw}' is not a valid {entity} id")).into()
    })
}
