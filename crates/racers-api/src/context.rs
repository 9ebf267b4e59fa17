//! Builds the per-request `RequestContext` from HTTP headers.

use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use racers_core::context::RequestContext;
use racers_core::id::Id;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::ApiError;

/// Header carrying the caller's correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
/// Header carrying the authenticated user id, set by the auth proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extracted request context. Dropping it cancels the context, so work still
/// running for an abandoned or timed-out request stops at its next check.
#[derive(Debug)]
pub struct Ctx {
    context: RequestContext,
    _cancel_on_drop: DropGuard,
}

impl Ctx {
    /// Builds the context from request headers.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if either header is present but not an id.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let token = CancellationToken::new();
        let mut context = RequestContext::new().with_cancellation(token.clone());
        if let Some(id) = header_id(headers, CORRELATION_ID_HEADER)? {
            context = context.with_correlation_id(id);
        }
        if let Some(id) = header_id(headers, USER_ID_HEADER)? {
            context = context.with_current_user(id);
        }
        Ok(Self {
            context,
            _cancel_on_drop: token.drop_guard(),
        })
    }

    /// The authenticated user's id, or 401.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::unauthenticated` for anonymous requests.
    pub fn require_user(&self) -> Result<Id, ApiError> {
        self.context
            .current_user()
            .ok_or_else(ApiError::unauthenticated)
    }
}

impl Deref for Ctx {
    type Target = RequestContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

fn header_id(headers: &HeaderMap, name: &str) -> Result<Option<Id>, ApiError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|err| ApiError::invalid_header(name, err))?;
    Id::parse(value.trim())
        .map(Some)
        .map_err(|err| ApiError::invalid_header(name, err))
}

impl<S: Send + Sync> FromRequestParts<S> for Ctx {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
