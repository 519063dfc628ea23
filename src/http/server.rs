//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app with a catch-all handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Hand every request to the active [`Router`](crate::routing::Router)
//! - Swap in rebuilt routers when the configuration changes
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response as AxumResponse},
    routing::any,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{build_router, AppConfig};
use crate::dispatch::DependencyResolver;
use crate::http::request::{request_id, Request};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{Router, RoutingError};

/// Routers are replaced whole; readers never see a partial registration.
pub type SharedRouter = Arc<ArcSwap<Router>>;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: SharedRouter,
    pub assume_https: bool,
    pub trust_forwarded_proto: bool,
}

/// HTTP server hosting a router.
pub struct HttpServer {
    app: axum::Router,
    routes: SharedRouter,
    config: AppConfig,
}

impl HttpServer {
    pub fn new(config: AppConfig, router: Router) -> Self {
        metrics::record_routes_registered(router.collection().len());
        let routes: SharedRouter = Arc::new(ArcSwap::from_pointee(router));
        let state = AppState {
            routes: routes.clone(),
            assume_https: config.listener.assume_https,
            trust_forwarded_proto: config.listener.trust_forwarded_proto,
        };
        let app = Self::build_app(&config, state);
        Self { app, routes, config }
    }

    /// Build the Axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &AppConfig, state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/", any(route_handler))
            .route("/{*path}", any(route_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(request_id))
            .layer(TraceLayer::new_for_http())
    }

    /// The app, for serving or for driving directly in tests.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    /// Handle for swapping the active router.
    pub fn routes(&self) -> SharedRouter {
        self.routes.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Serve until `shutdown` triggers, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.load().collection().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Make `router` the active router and return its route count.
pub fn activate(routes: &SharedRouter, router: Router) -> usize {
    let count = router.collection().len();
    routes.store(Arc::new(router));
    metrics::record_routes_registered(count);
    count
}

/// Rebuild and swap the router for every config received. A config that
/// fails to build leaves the current router in place.
pub async fn apply_reloads(
    routes: SharedRouter,
    mut updates: mpsc::UnboundedReceiver<AppConfig>,
    resolver: Arc<dyn DependencyResolver>,
    shutdown: Shutdown,
) {
    let mut stop = shutdown.subscribe();
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(config) = update else { break };
                match build_router(&config, resolver.clone()) {
                    Ok(router) => {
                        let count = activate(&routes, router);
                        metrics::record_config_reload("applied");
                        tracing::info!(routes = count, "Router reloaded");
                    }
                    Err(e) => {
                        metrics::record_config_reload("rejected");
                        tracing::error!(error = %e, "Reloaded config rejected, keeping current router");
                    }
                }
            }
            _ = stop.recv() => break,
        }
    }
    tracing::debug!("Reload loop stopped");
}

/// Match and dispatch one request on the blocking pool.
async fn route_handler(State(state): State<AppState>, request: axum::http::Request<Body>) -> AxumResponse {
    let started = Instant::now();
    let (parts, _body) = request.into_parts();
    let request = Request::from_parts(&parts, state.assume_https, state.trust_forwarded_proto);

    let method = request.method().to_string();
    let request_id = request.request_id().unwrap_or("unknown").to_string();
    tracing::debug!(
        request_id = %request_id,
        method = %method,
        host = %request.host(),
        path = %request.path(),
        "Routing request"
    );

    let router = state.routes.load_full();
    let response = match tokio::task::spawn_blocking(move || router.route(request)).await {
        Ok(Ok(response)) => response.into_response(),
        Ok(Err(e)) => error_response(&request_id, &e),
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Dispatch task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), started);
    response
}

fn error_response(request_id: &str, error: &RoutingError) -> AxumResponse {
    let status = error.status_code();
    if status.is_server_error() {
        tracing::error!(request_id = %request_id, error = %error, "Request failed");
    }
    let reason = status.canonical_reason().unwrap_or("Error");
    (status, reason).into_response()
}
