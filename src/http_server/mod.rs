//! # HTTP Server Module
//!
//! axum API over the auth and record services.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/auth/*` - OTP, agent signup and login
//! - `/policies/*` - Policy records (bearer token)
//! - `/applications/*` - Application records (bearer token)

pub mod auth_routes;
pub mod config;
pub mod errors;
pub mod extract;
pub mod middleware;
pub mod observability_routes;
pub mod record_routes;
pub mod response;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ErrorResponse};
pub use response::ApiResponse;
pub use server::{build_router, AppState, HttpServer};
