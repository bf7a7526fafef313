//! # Agents
//!
//! Agent model and repository. Agents sign up and log in with a phone
//! number and a one-time code; there are no passwords.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{AuthError, AuthResult};

/// Agent model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: Uuid,

    pub full_name: String,

    /// Normalized phone number (unique)
    pub phone: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Build a new agent from a signup request with an already normalized phone
    pub fn new(request: &SignupRequest, phone: String) -> AuthResult<Self> {
        let full_name = request.full_name.trim();
        if full_name.is_empty() {
            return Err(AuthError::InvalidInput("fullName must not be empty".into()));
        }
        if let Some(email) = &request.email {
            if !email.contains('@') {
                return Err(AuthError::InvalidInput(format!("invalid email '{}'", email)));
            }
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            phone,
            email: request.email.clone(),
            address: request.address.clone(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Trim separators and check the result looks like an E.164 number
pub fn normalize_phone(raw: &str) -> AuthResult<String> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);

    if !(7..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AuthError::InvalidPhone(raw.to_string()));
    }
    Ok(compact)
}

/// Request body of `POST /auth/otp`
#[derive(Debug, Clone, Deserialize)]
pub struct OtpRequest {
    pub phone: String,
}

/// Request body of `POST /auth/signup-agent`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub otp: String,
}

/// Request body of `POST /auth/login-agent`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub phone: String,
    pub otp: String,
}

/// Agent repository trait
pub trait AgentRepository: Send + Sync {
    fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Agent>>;

    fn find_by_phone(&self, phone: &str) -> AuthResult<Option<Agent>>;

    /// Create a new agent; fails when the phone is taken
    fn create(&self, agent: &Agent) -> AuthResult<()>;
}

/// In-memory agent repository
#[derive(Debug, Default)]
pub struct InMemoryAgentRepository {
    agents: RwLock<Vec<Agent>>,
}

impl InMemoryAgentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentRepository for InMemoryAgentRepository {
    fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Agent>> {
        let agents = self
            .agents
            .read()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;
        Ok(agents.iter().find(|a| a.id == id).cloned())
    }

    fn find_by_phone(&self, phone: &str) -> AuthResult<Option<Agent>> {
        let agents = self
            .agents
            .read()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;
        Ok(agents.iter().find(|a| a.phone == phone).cloned())
    }

    fn create(&self, agent: &Agent) -> AuthResult<()> {
        let mut agents = self
            .agents
            .write()
            .map_err(|_| AuthError::StorageError("Lock poisoned".to_string()))?;

        if agents.iter().any(|a| a.phone == agent.phone) {
            return Err(AuthError::AgentAlreadyExists);
        }

        agents.push(agent.clone());
        Ok(())
    }
}
