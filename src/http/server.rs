//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (rate limit, body limit, timeout, tracing, request ID)
//! - Own the rate limiter and its idle sweeper
//! - Bind server to listener and shut down gracefully

use axum::{
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServiceConfig;
use crate::http::handlers;
use crate::http::middleware::rate_limit_middleware;
use crate::http::request::{request_id, X_REQUEST_ID};
use crate::security::rate_limit::RateLimiter;
use crate::security::sanitize::Sanitizer;
use crate::ssn::SsnValidator;

pub const VALIDATE_PATH: &str = "/api/v1/ssn/validate";
pub const HEALTH_PATH: &str = "/health";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<SsnValidator>,
    pub sanitizer: Arc<Sanitizer>,
}

/// HTTP server for the validation API.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServiceConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        Self::with_limiter(config, limiter)
    }

    /// Create a server around an existing limiter (e.g. one driven by a mock clock).
    pub fn with_limiter(config: ServiceConfig, limiter: Arc<RateLimiter>) -> Self {
        let state = AppState {
            validator: Arc::new(SsnValidator::new()),
            sanitizer: Arc::new(Sanitizer::new()),
        };

        let router = Self::build_router(&config, state, limiter.clone());
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServiceConfig, state: AppState, limiter: Arc<RateLimiter>) -> Router {
        let routes = Router::new()
            .route(VALIDATE_PATH, post(handlers::validate_ssn))
            .route(HEALTH_PATH, get(handlers::health))
            .with_state(state);
        Self::apply_layers(routes, config, limiter)
    }

    /// Body limit and timeout sit inside the limiter so their 413/408
    /// responses still get the X-RateLimit headers.
    #[allow(deprecated)]
    fn apply_layers(routes: Router, config: &ServiceConfig, limiter: Arc<RateLimiter>) -> Router {
        routes
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id(request.headers()),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            requests_per_minute = self.limiter.limit(),
            "HTTP server starting"
        );

        let sweeper = self.limiter.clone().spawn_sweeper(
            Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
            shutdown.resubscribe(),
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The limiter guarding every route.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}
