#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood cache store backed by `DuckDB`.
//!
//! One row per discovered geographic area, keyed by the provider's area
//! identifier and looked up approximately by coordinate: a bounding-box
//! tolerance around the query point plus a freshness window. Expired
//! rows are treated as absent but never deleted, so a refresh simply
//! overwrites them in place.
//!
//! Also stores the lead records the host application hands over, so the
//! scoring engine can compute per-area conversion statistics.

pub mod areas;
pub mod leads;

use std::path::Path;

use duckdb::Connection;

/// Errors that can occur during cache store operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Cache matching policy: coordinate tolerance and freshness window.
///
/// The tolerance is a bounding box, not a true radius; 0.01° is roughly
/// one kilometre at mid latitudes. Adjacent cells can double-count
/// nearby coordinates as misses, which is an accepted approximation of
/// the original cache behavior — kept configurable rather than replaced
/// with geodesic matching so cache-hit behavior is preserved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    /// Half-width of the lookup bounding box, in degrees.
    pub tolerance_deg: f64,
    /// Rows older than this are treated as absent.
    pub ttl_days: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            tolerance_deg: 0.01,
            ttl_days: 30,
        }
    }
}

/// Opens (or creates) the neighborhood cache `DuckDB`.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    log::debug!("Opened neighborhood cache at {}", path.display());
    Ok(conn)
}

/// Opens an in-memory cache, used by tests and ephemeral sessions.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS neighborhoods (
            area_id TEXT NOT NULL PRIMARY KEY,
            name TEXT NOT NULL,
            city TEXT NOT NULL,
            region TEXT NOT NULL,
            latitude DOUBLE NOT NULL,
            longitude DOUBLE NOT NULL,
            median_income DOUBLE NOT NULL,
            avg_home_value DOUBLE NOT NULL,
            population_density DOUBLE NOT NULL,
            ownership_rate DOUBLE NOT NULL,
            score DOUBLE NOT NULL DEFAULT 0,
            last_updated BIGINT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS leads (
            id TEXT NOT NULL PRIMARY KEY,
            area_id TEXT NOT NULL,
            status TEXT NOT NULL
        );",
    )?;
    Ok(())
}
