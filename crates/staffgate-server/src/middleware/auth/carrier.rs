//! Locating the session id on a request.

use super::jwt::TokenDecoder;
use crate::error::ApiError;
use axum::http::{header, HeaderMap};
use staffgate_common_core::SessionId;
use std::sync::Arc;

/// Reads the session id from `Authorization: Bearer <jwt>` or the session
/// cookie, in that order.
#[derive(Debug, Clone)]
pub struct SessionCarrier {
    cookie_name: Arc<str>,
    decoder: TokenDecoder,
}

impl SessionCarrier {
    pub fn new(cookie_name: impl Into<Arc<str>>, decoder: TokenDecoder) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            decoder,
        }
    }

    pub fn decoder(&self) -> &TokenDecoder {
        &self.decoder
    }

    pub fn session_id(&self, headers: &HeaderMap) -> Result<SessionId, ApiError> {
        if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
            let auth_str = auth_header.to_str().map_err(|_| ApiError::InvalidToken)?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let claims = self.decoder.decode(token.trim())?;
                return Ok(claims.sid);
            }
        }

        if let Some(value) = cookie_value(headers, &self.cookie_name)? {
            return SessionId::parse(value).map_err(|_| ApiError::InvalidToken);
        }

        Err(ApiError::Unauthorized)
    }
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    for cookie_header in headers.get_all(header::COOKIE) {
        let cookie_str = cookie_header.to_str().map_err(|_| ApiError::InvalidToken)?;

        for cookie in cookie_str.split(';') {
            let value = cookie
                .trim()
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='));
            if let Some(value) = value {
                return Ok(Some(value));
            }
        }
    }
    Ok(None)
}
