//! Request extractors.
//!
//! [`ValidatedJson`] normalizes every JSON extraction failure (syntax,
//! missing fields, unknown fields, wrong content type) to a 400 validation
//! error, keeping the input-error contract uniform: a 400 means nothing was
//! persisted.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;

use crate::error::AppError;

/// JSON extractor whose rejection is an [`AppError::Validation`].
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::Validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}
