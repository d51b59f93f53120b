//! Extractors for the per-request authorization context.

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use staffgate_access::AuthContext;

/// The context the guard attached to this request.
pub struct Auth(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Auth)
            .ok_or(ApiError::Unauthorized)
    }
}
