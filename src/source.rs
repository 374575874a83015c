//! Remote detections data source.
//!
//! The core only asks the source for "every row of the detections relation".
//! Connection, authentication and query mechanics live here.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::RawTable;

// ---

/// Anything that can produce a full snapshot of the detections relation.
#[async_trait]
pub trait DetectionSource: Send + Sync {
    async fn fetch_all(&self) -> Result<RawTable>;
}

/// PostgreSQL-backed source.
///
/// The pool connects lazily, so an unreachable database surfaces as a
/// [`Error::Source`] on the first request rather than at startup.
pub struct PgDetectionSource {
    pool: PgPool,
    table: String,
}

impl PgDetectionSource {
    // ---
    pub fn connect_lazy(db_url: &str, api_key: &str, pool_max: u32, table: &str) -> Result<Self> {
        // ---
        let options = PgConnectOptions::from_str(db_url)
            .map_err(Error::InvalidDatabaseUrl)?
            .password(api_key);

        let pool = PgPoolOptions::new()
            .max_connections(pool_max)
            .connect_lazy_with(options);

        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }
}

#[async_trait]
impl DetectionSource for PgDetectionSource {
    // ---
    async fn fetch_all(&self) -> Result<RawTable> {
        // ---
        let columns: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT column_name::text
            FROM information_schema.columns
            WHERE table_schema = current_schema() AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(&self.table)
        .fetch_all(&self.pool)
        .await?;

        if columns.is_empty() {
            tracing::warn!("Relation '{}' not found or has no columns", self.table);
            return Ok(RawTable::default());
        }

        let sql = format!(
            r#"SELECT row_to_json(d)::jsonb FROM "{}" d"#,
            self.table.replace('"', "\"\"")
        );
        let rows: Vec<Json<Map<String, Value>>> =
            sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;

        tracing::info!(
            "Fetched {} rows ({} columns) from '{}'",
            rows.len(),
            columns.len(),
            self.table
        );

        Ok(RawTable {
            columns,
            rows: rows.into_iter().map(|Json(row)| row).collect(),
        })
    }
}
