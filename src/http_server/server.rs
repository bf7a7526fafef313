//! # HTTP Server
//!
//! Main HTTP server combining all endpoint routers.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::auth_routes::auth_routes;
use super::config::HttpServerConfig;
use super::observability_routes::health_routes;
use super::record_routes::record_routes;
use crate::auth::{AuthService, InMemoryAgentRepository, InMemoryOtpService, JwtManager};
use crate::config::PolicyHubConfig;
use crate::record::{Application, DocumentStore, InMemoryDocumentStore, Policy, RecordService};

/// Services shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub policies: Arc<RecordService<Policy>>,
    pub applications: Arc<RecordService<Application>>,
}

impl AppState {
    /// In-memory stores wired from configuration
    pub fn from_config(config: &PolicyHubConfig) -> Self {
        let auth = AuthService::new(
            Arc::new(InMemoryAgentRepository::new()),
            Arc::new(InMemoryOtpService::new(config.auth.otp_config())),
            JwtManager::new(config.auth.jwt_config()),
        );

        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        Self {
            auth: Arc::new(auth),
            policies: Arc::new(RecordService::new(Arc::clone(&store), config.records.clone())),
            applications: Arc::new(RecordService::new(store, config.records.clone())),
        }
    }
}

/// HTTP server for the policy API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: &PolicyHubConfig) -> Self {
        Self::with_state(config.server.clone(), AppState::from_config(config))
    }

    pub fn with_state(config: HttpServerConfig, state: AppState) -> Self {
        let router = build_router(&config, state);
        Self { config, router }
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    pub async fn start(self) -> Result<(), io::Error> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "policyhub listening");

        axum::serve(listener, self.router).await
    }
}

/// Build the combined router with all endpoints
pub fn build_router(config: &HttpServerConfig, state: AppState) -> Router {
    let cors = if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(health_routes())
        .nest("/auth", auth_routes(Arc::clone(&state.auth)))
        .nest(
            "/policies",
            record_routes(state.policies, Arc::clone(&state.auth)),
        )
        .nest(
            "/applications",
            record_routes(state.applications, state.auth),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_socket_addr() {
        let mut config = PolicyHubConfig::default();
        config.server = HttpServerConfig::with_port(9090);
        let server = HttpServer::new(&config);
        assert_eq!(server.socket_addr(), "0.0.0.0:9090");
    }

    #[test]
    fn test_router_builds_with_origin_list() {
        let mut config = PolicyHubConfig::default();
        config.server.cors_origins = vec!["http://localhost:5173".into()];
        let _router = HttpServer::new(&config).router();
    }
}
