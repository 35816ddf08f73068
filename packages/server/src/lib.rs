//! Shelter dashboard server: document storage, CRUD, CSV import, the
//! dashboard pipeline, and its HTTP API.

pub mod cli;
pub mod dashboard;
pub mod loader;
pub mod network;
pub mod shelter;
pub mod storage;
pub mod telemetry;

pub use cli::ServerArgs;
pub use dashboard::{Dashboard, DashboardConfig, DashboardEvent, DashboardState, DashboardView};
pub use loader::{import_csv, ImportSummary, LoadError};
pub use network::{NetworkConfig, NetworkModule};
pub use shelter::{AnimalShelter, CrudError};
pub use storage::{DocumentStore, MemoryDocumentStore, StoreError};
