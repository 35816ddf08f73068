//! HTTP handlers for the shelter server.
//!
//! Defines [`AppState`], the state every handler extracts, and
//! [`ApiError`], the JSON error response shared by the API routes.

pub mod dashboard;
pub mod error;
pub mod health;
pub mod records;

pub use dashboard::{
    apply_event_handler, close_session_handler, dashboard_handler, get_session_handler,
    open_session_handler,
};
pub use error::ApiError;
pub use health::{health_handler, liveness_handler, readiness_handler};
pub use records::{
    count_records_handler, create_record_handler, delete_records_handler, read_records_handler,
    update_records_handler,
};

use std::sync::Arc;
use std::time::Instant;

use super::Lifecycle;
use crate::dashboard::Dashboard;
use crate::shelter::AnimalShelter;

/// Shared state passed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Dashboard,
    pub shelter: AnimalShelter,
    pub lifecycle: Arc<Lifecycle>,
    /// Process start, for uptime.
    pub start_time: Instant,
}
