use crate::error::AppError;
use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

/// JSON body extractor whose rejections are rendered as `AppError::Validation`
/// (400 with a `detail` body) instead of axum's plain-text 415/422.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read body: {}", e)))?;

        let value = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Validation(format!("JSON parse error: {}", e)))?;

        Ok(ApiJson(value))
    }
}

/// Path extractor. A segment that does not parse (`/recipes/abc/`) names no
/// record, so it is a 404 with a `detail` body.
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(PathRejection::FailedToDeserializePathParams(e)) => {
                tracing::debug!("Unmatched path parameter: {}", e);
                Err(AppError::NotFound("Resource"))
            }
            Err(e) => {
                tracing::error!("Path extraction failed: {}", e);
                Err(AppError::InternalError)
            }
        }
    }
}

/// Query string extractor whose rejections are 400s with a `detail` body.
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(ApiQuery(value))
    }
}
