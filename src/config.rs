//! Service configuration
//!
//! A single JSON file with three sections, every field optional:
//!
//! ```json
//! {
//!   "server":  { "host": "0.0.0.0", "port": 8080, "cors_origins": [] },
//!   "auth":    { "jwt_secret": "…", "token_ttl_minutes": 60, "otp_ttl_seconds": 180 },
//!   "records": { "schema_change": "permissive", "default_limit": 10, "max_limit": 100 }
//! }
//! ```
//!
//! A missing file yields the defaults. `POLICYHUB_JWT_SECRET` overrides
//! `auth.jwt_secret`.

use std::fs;
use std::io;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{JwtConfig, OtpConfig};
use crate::http_server::HttpServerConfig;
use crate::record::RecordSettings;

/// Environment variable overriding the JWT secret
pub const JWT_SECRET_ENV: &str = "POLICYHUB_JWT_SECRET";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Auth section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_issuer")]
    pub issuer: String,

    #[serde(default = "default_issuer")]
    pub audience: String,

    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,

    #[serde(default = "default_otp_ttl_seconds")]
    pub otp_ttl_seconds: i64,

    /// Issue this code for every OTP request (development only)
    #[serde(default)]
    pub otp_fixed_code: Option<String>,
}

fn default_jwt_secret() -> String {
    "CHANGE_THIS_SECRET_IN_PRODUCTION".to_string()
}

fn default_issuer() -> String {
    "policyhub".to_string()
}

fn default_token_ttl_minutes() -> i64 {
    60
}

fn default_otp_ttl_seconds() -> i64 {
    180
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            issuer: default_issuer(),
            audience: default_issuer(),
            token_ttl_minutes: default_token_ttl_minutes(),
            otp_ttl_seconds: default_otp_ttl_seconds(),
            otp_fixed_code: None,
        }
    }
}

impl AuthSettings {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            access_token_ttl: Duration::minutes(self.token_ttl_minutes),
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
        }
    }

    pub fn otp_config(&self) -> OtpConfig {
        OtpConfig {
            ttl: Duration::seconds(self.otp_ttl_seconds),
            fixed_code: self.otp_fixed_code.clone(),
            ..OtpConfig::default()
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyHubConfig {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub records: RecordSettings,
}

impl PolicyHubConfig {
    /// Load from `path`, falling back to defaults when the file does not exist,
    /// then apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        if let Ok(secret) = std::env::var(JWT_SECRET_ENV) {
            config.auth.jwt_secret = secret;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document without environment overrides
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".into()));
        }
        if self.auth.token_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid("auth.token_ttl_minutes must be > 0".into()));
        }
        if self.auth.otp_ttl_seconds <= 0 {
            return Err(ConfigError::Invalid("auth.otp_ttl_seconds must be > 0".into()));
        }
        if self.records.default_limit == 0 {
            return Err(ConfigError::Invalid("records.default_limit must be > 0".into()));
        }
        if self.records.default_limit > self.records.max_limit {
            return Err(ConfigError::Invalid(format!(
                "records.default_limit ({}) exceeds records.max_limit ({})",
                self.records.default_limit, self.records.max_limit
            )));
        }
        Ok(())
    }
}
