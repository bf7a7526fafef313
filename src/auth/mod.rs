//! # Auth Module
//!
//! Agent signup and login via phone OTP, and JWT bearer tokens for the
//! record routes.

pub mod agent;
pub mod errors;
pub mod jwt;
pub mod otp;
pub mod service;

pub use agent::{Agent, AgentRepository, InMemoryAgentRepository, LoginRequest, OtpRequest, SignupRequest};
pub use errors::{AuthError, AuthResult};
pub use jwt::{JwtClaims, JwtConfig, JwtManager, Role, TokenResponse};
pub use otp::{InMemoryOtpService, IssuedOtp, OtpConfig, OtpService};
pub use service::{AuthService, AuthSession, OtpTicket};
