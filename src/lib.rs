//! Backend for the bird migration map dashboard.
//!
//! Follows the Explicit Module Boundary Pattern (EMBP): `pipeline` and
//! `routes` are gateways over their private submodules, and the binary goes
//! through `config` and the re-exports below.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod snapshot;
pub mod source;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{ClusterSummary, Detection, RawRow, RawTable};
pub use routes::AppState;
pub use snapshot::SnapshotCache;
pub use source::{DetectionSource, PgDetectionSource};
