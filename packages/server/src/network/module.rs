//! HTTP server with deferred startup.
//!
//! `new()` wires shared state, `start()` binds the listener, and `serve()`
//! accepts connections until the shutdown future resolves. Seeding the
//! collection happens between `start()` and `serve()`, while readiness
//! still reports `starting`.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{
    apply_event_handler, close_session_handler, count_records_handler, create_record_handler,
    dashboard_handler, delete_records_handler, get_session_handler, health_handler,
    liveness_handler, open_session_handler, read_records_handler, readiness_handler,
    update_records_handler, AppState,
};
use super::lifecycle::Lifecycle;
use super::middleware::{build_http_layers, track_in_flight};
use crate::dashboard::Dashboard;
use crate::shelter::AnimalShelter;

/// How long `serve()` waits for in-flight requests after shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the listener and the state shared by every handler.
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    state: AppState,
}

impl NetworkModule {
    #[must_use]
    pub fn new(config: NetworkConfig, dashboard: Dashboard, shelter: AnimalShelter) -> Self {
        Self {
            config,
            listener: None,
            state: AppState {
                dashboard,
                shelter,
                lifecycle: Arc::new(Lifecycle::new()),
                start_time: Instant::now(),
            },
        }
    }

    #[must_use]
    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        Arc::clone(&self.state.lifecycle)
    }

    /// Assembles routes and middleware.
    ///
    /// - `GET /health`, `/health/live`, `/health/ready`
    /// - `GET /api/dashboard`
    /// - `POST /api/sessions`, `GET|DELETE /api/sessions/{id}`,
    ///   `POST /api/sessions/{id}/events`
    /// - `GET|POST|PATCH|DELETE /api/records`, `GET /api/records/count`
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Binds the listener and returns the bound port (useful with port 0).
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();
        info!(host = %self.config.host, port, "listener bound");
        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves until `shutdown` resolves, then drains in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called or on a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let router = self.build_router();
        let lifecycle = Arc::clone(&self.state.lifecycle);

        lifecycle.set_ready();
        info!("serving HTTP");

        let drain = Arc::clone(&lifecycle);
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                drain.begin_drain();
            })
            .await?;

        if lifecycle.wait_for_drain(DRAIN_TIMEOUT).await {
            info!("all requests drained");
        } else {
            warn!(
                in_flight = lifecycle.in_flight_count(),
                "drain timeout expired with requests in flight"
            );
        }
        Ok(())
    }
}

/// Builds the full router over `state`.
pub fn build_router(state: AppState, config: &NetworkConfig) -> Router {
    let api = Router::new()
        .route("/dashboard", get(dashboard_handler))
        .route("/sessions", axum::routing::post(open_session_handler))
        .route(
            "/sessions/{id}",
            get(get_session_handler).delete(close_session_handler),
        )
        .route("/sessions/{id}/events", axum::routing::post(apply_event_handler))
        .route(
            "/records",
            get(read_records_handler)
                .post(create_record_handler)
                .patch(update_records_handler)
                .delete(delete_records_handler),
        )
        .route("/records/count", get(count_records_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_in_flight));

    Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .nest("/api", api)
        .layer(build_http_layers(config))
        .with_state(state)
}
