//! # One-Time Codes
//!
//! Phone OTP issuance and verification.
//!
//! ## Invariants
//! - Only a SHA-256 hash of each code is held
//! - Codes are compared in constant time
//! - A code verifies at most once and never after its expiry
//! - A new code cannot be issued while one is pending for the same phone

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use super::errors::{AuthError, AuthResult};

/// OTP settings
#[derive(Debug, Clone)]
pub struct OtpConfig {
    /// Lifetime of an issued code
    pub ttl: Duration,

    /// Number of digits in generated codes
    pub code_length: usize,

    /// Issue this code instead of a random one (development only)
    pub fixed_code: Option<String>,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(3),
            code_length: 6,
            fixed_code: None,
        }
    }
}

/// A freshly issued code. Delivery is out of scope; the code is logged at debug level.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub phone: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies one-time codes per phone number
pub trait OtpService: Send + Sync {
    fn issue(&self, phone: &str) -> AuthResult<IssuedOtp>;

    /// True when `code` is the pending, unexpired code for `phone`;
    /// a successful check consumes the code.
    fn verify(&self, phone: &str, code: &str) -> AuthResult<bool>;
}

#[derive(Debug, Clone)]
struct PendingOtp {
    code_hash: [u8; 32],
    expires_at: DateTime<Utc>,
}

/// In-memory OTP service
#[derive(Debug, Default)]
pub struct InMemoryOtpService {
    config: OtpConfig,
    pending: RwLock<HashMap<String, PendingOtp>>,
}

impl InMemoryOtpService {
    pub fn new(config: OtpConfig) -> Self {
        Self {
            config,
            pending: RwLock::new(HashMap::new()),
        }
    }

    fn generate_code(&self) -> String {
        if let Some(code) = &self.config.fixed_code {
            return code.clone();
        }
        let mut rng = rand::thread_rng();
        (0..self.config.code_length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    /// Drop expired entries
    pub fn cleanup_expired(&self) -> AuthResult<usize> {
        let now = Utc::now();
        let mut pending = self.lock_write()?;
        let before = pending.len();
        pending.retain(|_, otp| otp.expires_at > now);
        Ok(before - pending.len())
    }

    fn lock_write(&self) -> AuthResult<std::sync::RwLockWriteGuard<'_, HashMap<String, PendingOtp>>> {
        self.pending
            .write()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))
    }
}

fn hash_code(code: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(code.as_bytes()));
    out
}

impl OtpService for InMemoryOtpService {
    fn issue(&self, phone: &str) -> AuthResult<IssuedOtp> {
        let now = Utc::now();
        let mut pending = self.lock_write()?;

        if let Some(existing) = pending.get(phone) {
            if existing.expires_at > now {
                let retry_after_secs = (existing.expires_at - now).num_seconds().max(1);
                return Err(AuthError::OtpCooldown { retry_after_secs });
            }
        }

        let code = self.generate_code();
        let expires_at = now + self.config.ttl;
        pending.insert(
            phone.to_string(),
            PendingOtp {
                code_hash: hash_code(&code),
                expires_at,
            },
        );

        debug!(phone, code = %code, %expires_at, "otp issued");
        Ok(IssuedOtp {
            phone: phone.to_string(),
            code,
            expires_at,
        })
    }

    fn verify(&self, phone: &str, code: &str) -> AuthResult<bool> {
        let now = Utc::now();
        let mut pending = self.lock_write()?;

        let Some(entry) = pending.get(phone) else {
            debug!(phone, "otp verification without pending code");
            return Ok(false);
        };

        if entry.expires_at <= now {
            pending.remove(phone);
            debug!(phone, "otp expired");
            return Ok(false);
        }

        let matches: bool = entry.code_hash[..].ct_eq(&hash_code(code)[..]).into();
        if matches {
            pending.remove(phone);
        } else {
            debug!(phone, "otp mismatch");
        }
        Ok(matches)
    }
}
