#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Neighborhood recommendation engine.
//!
//! Orchestrates the census adapter and the cache store behind a small
//! caller-facing surface: fetch an area for a coordinate, score cached
//! areas against targeting preferences, and rank them.
//!
//! The service object is constructed explicitly with its store and
//! provider (no process-wide singleton), so tests substitute a mock
//! provider and an in-memory store.

pub mod presets;
pub mod scoring;
pub mod service;

pub use service::NeighborhoodService;
pub use turf_scout_database::CacheConfig;

use thiserror::Error;

/// Errors surfaced by the engine's caller-facing operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The coordinate is outside WGS84 bounds or non-finite.
    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// Offending latitude.
        latitude: f64,
        /// Offending longitude.
        longitude: f64,
    },

    /// Demographic resolution or statistics fetch failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] turf_scout_census::CensusError),

    /// Cache store read or write failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] turf_scout_database::DbError),
}
