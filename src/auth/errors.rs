//! # Auth Errors
//!
//! Error types for agent authentication.

use thiserror::Error;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication and authorization errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // ==================
    // Request Errors
    // ==================
    /// Phone number is not a plausible E.164 number
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    /// Required signup attribute missing or blank
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ==================
    // OTP Errors
    // ==================
    /// Code is wrong, expired, already used, or was never issued
    #[error("Invalid or expired OTP")]
    InvalidOtp,

    /// A code for this phone is still pending
    #[error("You can request a new OTP in {retry_after_secs} seconds")]
    OtpCooldown { retry_after_secs: i64 },

    // ==================
    // Agent Errors
    // ==================
    /// Phone already registered
    #[error("Agent already exists")]
    AgentAlreadyExists,

    /// No agent for this phone (generic; does not confirm registration)
    #[error("Invalid credentials")]
    InvalidCredentials,

    // ==================
    // Token Errors
    // ==================
    /// No bearer token on a protected route
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Token is not a decodable JWT
    #[error("Malformed token")]
    MalformedToken,

    /// Token has expired
    #[error("Token expired")]
    TokenExpired,

    /// Token signature is invalid
    #[error("Invalid token signature")]
    InvalidSignature,

    // ==================
    // Internal Errors
    // ==================
    /// Token generation failed
    #[error("Internal error: token generation failed")]
    TokenGenerationFailed,

    /// Storage operation failed
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            AuthError::InvalidPhone(_) => 400,
            AuthError::InvalidInput(_) => 400,

            // 401 Unauthorized
            AuthError::InvalidOtp => 401,
            AuthError::InvalidCredentials => 401,
            AuthError::AuthenticationRequired => 401,
            AuthError::MalformedToken => 401,
            AuthError::TokenExpired => 401,
            AuthError::InvalidSignature => 401,

            // 409 Conflict
            AuthError::AgentAlreadyExists => 409,

            // 429 Too Many Requests
            AuthError::OtpCooldown { .. } => 429,

            // 500 Internal Server Error
            AuthError::TokenGenerationFailed => 500,
            AuthError::StorageError(_) => 500,
        }
    }

    /// Returns whether this error should be logged at warn level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
