//! Auth HTTP Routes
//!
//! Phone OTP issuance, agent signup and agent login.

use std::sync::Arc;

use axum::{extract::State, response::Response, routing::post, Router};

use super::errors::ApiError;
use super::extract::ApiJson;
use super::response::ApiResponse;
use crate::auth::{AuthService, LoginRequest, OtpRequest, SignupRequest};

/// Auth routes with shared state
pub fn auth_routes(auth: Arc<AuthService>) -> Router {
    Router::new()
        .route("/otp", post(otp_handler))
        .route("/signup-agent", post(signup_handler))
        .route("/login-agent", post(login_handler))
        .with_state(auth)
}

async fn otp_handler(
    State(auth): State<Arc<AuthService>>,
    ApiJson(req): ApiJson<OtpRequest>,
) -> Result<Response, ApiError> {
    let ticket = auth.request_otp(&req.phone)?;
    Ok(ApiResponse::ok("OTP sent successfully", ticket))
}

async fn signup_handler(
    State(auth): State<Arc<AuthService>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<Response, ApiError> {
    let session = auth.signup(req)?;
    Ok(ApiResponse::created("Agent registered successfully", session))
}

async fn login_handler(
    State(auth): State<Arc<AuthService>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Response, ApiError> {
    let session = auth.login(req)?;
    Ok(ApiResponse::ok("Login successful", session))
}
