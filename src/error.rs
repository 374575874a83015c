//! Error taxonomy for the dashboard backend.
//!
//! An empty filter result is deliberately absent here: it is a normal
//! `no_data` response, not a failure.

/// Result type alias for dashboard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither the environment nor the key file supplied the secret.
    #[error("API key not found: set {env_var} or create '{path}'")]
    MissingCredential {
        /// Environment variable that was checked.
        env_var: &'static str,
        /// Key file that was checked.
        path: std::path::PathBuf,
    },

    /// The database URL could not be parsed.
    #[error("invalid database URL: {0}")]
    InvalidDatabaseUrl(#[source] sqlx::Error),

    /// The detections relation is missing required columns.
    #[error("detections data must contain columns: {}", missing.join(", "))]
    Schema {
        /// Source column names that were not found.
        missing: Vec<String>,
    },

    /// The data source was unreachable or rejected the query.
    #[error("data source error: {0}")]
    Source(#[from] sqlx::Error),

    /// A request carried a filter that could not be interpreted.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

impl Error {
    /// Stable machine-readable category used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MissingCredential { .. } | Error::InvalidDatabaseUrl(_) => "configuration",
            Error::Schema { .. } => "schema",
            Error::Source(_) => "source",
            Error::InvalidFilter(_) => "bad_request",
        }
    }
}
