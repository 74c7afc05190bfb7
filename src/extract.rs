//! Request extractors that reject bad input with the app's JSON error envelope.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request, rejection::PathRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{Error, database_id::DatabaseId};

/// A JSON body that has been deserialized and validated.
///
/// Syntax errors, missing fields and failed validation rules are all
/// rejected with [Error::InvalidInput].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| {
                Error::InvalidInput(format!(
                    "Verifica los datos enviados: {}",
                    rejection.body_text()
                ))
            })?;

        value.validate()?;

        Ok(Self(value))
    }
}

/// Query string parameters that failed to parse are rejected with
/// [Error::InvalidParameter].
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::InvalidParameter(rejection.body_text()))?;

        Ok(Self(value))
    }
}

/// The integer `{id}` segment of a resource path.
///
/// An id that does not parse cannot refer to a stored row, so it is rejected
/// as [Error::NotFound].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub DatabaseId);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<DatabaseId>::from_request_parts(parts, state).await?;

        Ok(Self(id))
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Rejected resource path: {}", rejection.body_text());
        Error::NotFound
    }
}
