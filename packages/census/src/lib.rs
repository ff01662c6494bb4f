#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Demographic data adapter for the neighborhood engine.
//!
//! Resolves a coordinate to an administrative area identifier plus raw
//! demographic statistics, routing between two providers:
//!
//! 1. **US Census Bureau** — free geographies lookup (coordinate → tract
//!    GEOID) followed by an ACS statistics query. No API key required.
//! 2. **Canadian regions** — nearest-centroid match against a compile-time
//!    region table, with a postal-code (FSA) fallback via reverse
//!    geocoding, and curated per-region estimates when live statistics
//!    are unavailable.
//!
//! Routing is by bounding box: coordinates inside Canada's box go to the
//! Canadian provider, everything else to the US provider.

pub mod canada;
pub mod registry;
pub mod us;

use async_trait::async_trait;
use thiserror::Error;
use turf_scout_neighborhood_models::{Coordinate, RawDemographics};

/// Canada bounding box used for provider routing.
///
/// Deliberately coarse; it only needs to separate Canadian coordinates
/// from US ones for routing purposes.
pub const CANADA_LAT_RANGE: (f64, f64) = (41.7, 83.1);
/// Longitude component of the Canada routing box.
pub const CANADA_LON_RANGE: (f64, f64) = (-141.0, -52.6);

/// Returns `true` if the coordinate falls inside the Canada routing box.
#[must_use]
pub fn in_canada(coordinate: Coordinate) -> bool {
    (CANADA_LAT_RANGE.0..=CANADA_LAT_RANGE.1).contains(&coordinate.latitude)
        && (CANADA_LON_RANGE.0..=CANADA_LON_RANGE.1).contains(&coordinate.longitude)
}

/// Errors from demographic resolution.
#[derive(Debug, Error)]
pub enum CensusError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The coordinate could not be mapped to any area identifier.
    #[error("Resolution failed: {message}")]
    Resolution {
        /// Description of why resolution failed.
        message: String,
    },
}

/// A resolved administrative area: identifier, display metadata, and the
/// raw statistics to cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedArea {
    /// Stable area identifier (tract GEOID or region key).
    pub area_id: String,
    /// Human-readable area name.
    pub name: String,
    /// City name, empty when the provider cannot determine one.
    pub city: String,
    /// State or province abbreviation.
    pub region: String,
    /// Demographic figures for the area.
    pub demographics: RawDemographics,
}

/// Trait implemented by every demographic data provider.
///
/// The engine depends on this seam so tests can substitute a mock
/// provider and count network-level calls.
#[async_trait]
pub trait DemographicProvider: Send + Sync {
    /// Resolves a coordinate to an area identifier and raw statistics.
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::Resolution`] when no area identifier can be
    /// determined for the coordinate, and [`CensusError::Http`] /
    /// [`CensusError::Parse`] for transport and decoding failures that
    /// have no fallback.
    async fn resolve(&self, coordinate: Coordinate) -> Result<ResolvedArea, CensusError>;
}

/// Routing adapter that dispatches to the US or Canadian provider based
/// on the coordinate's bounding box.
pub struct CensusAdapter {
    us: us::UsCensusProvider,
    canada: canada::CanadaProvider,
}

impl CensusAdapter {
    /// Creates an adapter with both providers on their default endpoints,
    /// sharing one HTTP client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            us: us::UsCensusProvider::new(client.clone()),
            canada: canada::CanadaProvider::new(client),
        }
    }

    /// Creates an adapter from pre-built providers. Used by tests to
    /// point both paths at stub endpoints.
    #[must_use]
    pub const fn from_providers(
        us: us::UsCensusProvider,
        canada: canada::CanadaProvider,
    ) -> Self {
        Self { us, canada }
    }
}

#[async_trait]
impl DemographicProvider for CensusAdapter {
    async fn resolve(&self, coordinate: Coordinate) -> Result<ResolvedArea, CensusError> {
        if in_canada(coordinate) {
            log::debug!(
                "Routing ({}, {}) to Canadian provider",
                coordinate.latitude,
                coordinate.longitude
            );
            self.canada.resolve(coordinate).await
        } else {
            log::debug!(
                "Routing ({}, {}) to US provider",
                coordinate.latitude,
                coordinate.longitude
            );
            self.us.resolve(coordinate).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toronto_routes_to_canada() {
        assert!(in_canada(Coordinate::new(43.65, -79.38)));
    }

    #[test]
    fn san_francisco_routes_to_us() {
        assert!(!in_canada(Coordinate::new(37.77, -122.41)));
    }

    #[test]
    fn mexico_city_routes_to_us_provider() {
        // Everything outside the Canada box takes the US path, even when
        // the US provider will ultimately fail to resolve it.
        assert!(!in_canada(Coordinate::new(19.43, -99.13)));
    }

    #[test]
    fn routing_box_edges() {
        // Fairbanks is west of the box; Whitehorse is inside it.
        assert!(!in_canada(Coordinate::new(64.2, -149.0)));
        assert!(in_canada(Coordinate::new(60.7, -135.0)));
    }
}
