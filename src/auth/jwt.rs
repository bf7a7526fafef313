//! # JWT Token Management
//!
//! Bearer tokens for authenticated agents. Validation is stateless: the
//! signature, expiry, issuer and audience are checked without a lookup.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::agent::Agent;
use super::errors::{AuthError, AuthResult};

/// Role carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Agent,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Agent => f.write_str("agent"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// JWT claims for access tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (agent ID)
    pub sub: String,

    pub role: Role,

    /// Issued at timestamp (Unix epoch seconds)
    pub iat: i64,

    /// Expiration timestamp (Unix epoch seconds)
    pub exp: i64,

    pub aud: String,

    pub iss: String,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret
    pub secret: String,

    /// Access token lifetime
    pub access_token_ttl: Duration,

    pub issuer: String,

    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "CHANGE_THIS_SECRET_IN_PRODUCTION".to_string(),
            access_token_ttl: Duration::minutes(60),
            issuer: "policyhub".to_string(),
            audience: "policyhub".to_string(),
        }
    }
}

/// JWT manager for token generation and validation
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.config.issuer)
            .field("audience", &self.config.audience)
            .field("access_token_ttl", &self.config.access_token_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue an access token for an arbitrary subject
    pub fn issue(&self, subject: &str, role: Role) -> AuthResult<TokenResponse> {
        let now = Utc::now();
        let expires_at = now + self.config.access_token_ttl;

        let claims = JwtClaims {
            sub: subject.to_string(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)?;
        Ok(TokenResponse::new(token, expires_at))
    }

    /// Issue an agent-role access token
    pub fn generate_access_token(&self, agent: &Agent) -> AuthResult<TokenResponse> {
        self.issue(&agent.id.to_string(), Role::Agent)
    }

    /// Validate an access token and extract claims
    pub fn validate_token(&self, token: &str) -> AuthResult<JwtClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);

        let token_data =
            decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::MalformedToken,
                }
            })?;

        Ok(token_data.claims)
    }
}

/// Token response returned to client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: i64,
}

impl TokenResponse {
    pub fn new(access_token: String, expires_at: DateTime<Utc>) -> Self {
        let expires_in = (expires_at - Utc::now()).num_seconds();

        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_in,
            expires_at: expires_at.timestamp(),
        }
    }
}
