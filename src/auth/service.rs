//! # Auth Service
//!
//! Agent signup and login over phone OTP, plus bearer-token checks for
//! protected routes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::agent::{normalize_phone, Agent, AgentRepository, LoginRequest, SignupRequest};
use super::errors::{AuthError, AuthResult};
use super::jwt::{JwtClaims, JwtManager, TokenResponse};
use super::otp::OtpService;

/// Agent plus a fresh access token
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub agent: Agent,
    pub token: TokenResponse,
}

/// Public view of an issued code
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpTicket {
    pub phone: String,
    pub expires_at: DateTime<Utc>,
}

/// Auth service combining agents, codes and tokens
#[derive(Clone)]
pub struct AuthService {
    agents: Arc<dyn AgentRepository>,
    otp: Arc<dyn OtpService>,
    jwt_manager: JwtManager,
}

impl AuthService {
    pub fn new(agents: Arc<dyn AgentRepository>, otp: Arc<dyn OtpService>, jwt_manager: JwtManager) -> Self {
        Self {
            agents,
            otp,
            jwt_manager,
        }
    }

    pub fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    /// Issue a code for `phone`
    pub fn request_otp(&self, phone: &str) -> AuthResult<OtpTicket> {
        let phone = normalize_phone(phone)?;
        let issued = self.otp.issue(&phone)?;
        Ok(OtpTicket {
            phone: issued.phone,
            expires_at: issued.expires_at,
        })
    }

    /// Register an agent after checking its code
    pub fn signup(&self, request: SignupRequest) -> AuthResult<AuthSession> {
        let phone = normalize_phone(&request.phone)?;
        let agent = Agent::new(&request, phone)?;

        if self.agents.find_by_phone(&agent.phone)?.is_some() {
            return Err(AuthError::AgentAlreadyExists);
        }
        self.check_otp(&agent.phone, &request.otp)?;

        self.agents.create(&agent)?;
        let token = self.jwt_manager.generate_access_token(&agent)?;
        info!(agent_id = %agent.id, "agent signed up");

        Ok(AuthSession { agent, token })
    }

    /// Log an existing agent in with a code
    pub fn login(&self, request: LoginRequest) -> AuthResult<AuthSession> {
        let phone = normalize_phone(&request.phone)?;
        let agent = self
            .agents
            .find_by_phone(&phone)?
            .ok_or(AuthError::InvalidCredentials)?;

        self.check_otp(&phone, &request.otp)?;

        let token = self.jwt_manager.generate_access_token(&agent)?;
        info!(agent_id = %agent.id, "agent logged in");

        Ok(AuthSession { agent, token })
    }

    /// Validate a bearer token
    pub fn authenticate(&self, token: &str) -> AuthResult<JwtClaims> {
        self.jwt_manager.validate_token(token)
    }

    fn check_otp(&self, phone: &str, code: &str) -> AuthResult<()> {
        if self.otp.verify(phone, code.trim())? {
            Ok(())
        } else {
            warn!(phone, "otp rejected");
            Err(AuthError::InvalidOtp)
        }
    }
}
