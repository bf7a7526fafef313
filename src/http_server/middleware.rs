//! Bearer token middleware
//!
//! Rejects requests without a valid `Authorization: Bearer <jwt>` header and
//! stores the decoded `JwtClaims` in the request extensions.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::errors::ApiError;
use crate::auth::{AuthError, AuthService};

/// Extract the bearer token from an Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn require_bearer(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers()).ok_or(AuthError::AuthenticationRequired)?;
    let claims = auth.authenticate(token)?;

    debug!(subject = %claims.sub, role = %claims.role, "request authenticated");
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
