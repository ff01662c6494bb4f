#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Domain types for the neighborhood recommendation engine.
//!
//! Defines the cached geographic area record, the raw demographic figures
//! produced by the census adapter, lead status for conversion statistics,
//! and the user-configured targeting preferences and scoring weights.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate without validation.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` if both components are finite and within WGS84
    /// bounds (lat in [-90, 90], lon in [-180, 180]).
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Raw demographic figures for one administrative area, as returned by
/// a census provider before caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDemographics {
    /// Median household income in local currency units.
    pub median_income: f64,
    /// Average home value in local currency units.
    pub avg_home_value: f64,
    /// Population density (people per square mile/km, provider-defined).
    pub population_density: f64,
    /// Home-ownership rate as a fraction in [0, 1].
    pub ownership_rate: f64,
    /// `true` when the figures came from a curated estimate table rather
    /// than a live statistics endpoint.
    pub estimated: bool,
}

/// A cached administrative region with demographic data and a computed
/// suitability score.
///
/// One row per area identifier; created on first lookup of an uncached
/// coordinate, refreshed when stale, never explicitly deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicArea {
    /// Stable, opaque area identifier (census tract GEOID or
    /// provider-specific region key).
    pub area_id: String,
    /// Human-readable area name.
    pub name: String,
    /// City the area belongs to.
    pub city: String,
    /// State or province abbreviation.
    pub region: String,
    /// Center latitude (WGS84).
    pub latitude: f64,
    /// Center longitude (WGS84).
    pub longitude: f64,
    /// Median household income.
    pub median_income: f64,
    /// Average home value.
    pub avg_home_value: f64,
    /// Population density.
    pub population_density: f64,
    /// Home-ownership rate in [0, 1].
    pub ownership_rate: f64,
    /// Suitability score in [0, 100]; 0 until first scoring pass.
    pub score: f64,
    /// When the demographic figures were last fetched.
    pub last_updated: DateTime<Utc>,
}

impl GeographicArea {
    /// Returns the area's center coordinate.
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Door-knock outcome for a single lead.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeadStatus {
    /// Not yet visited.
    NotContacted,
    /// Expressed interest but has not converted.
    Interested,
    /// Became a customer.
    Converted,
    /// Declined.
    NotInterested,
    /// Nobody answered.
    NotHome,
}

/// A sales lead referencing the area it was knocked in.
///
/// Leads are owned by the host application; the engine reads them only
/// to compute per-area conversion statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    /// Unique lead identifier.
    pub id: String,
    /// Back-reference to the [`GeographicArea`] this lead belongs to.
    pub area_id: String,
    /// Current outcome.
    pub status: LeadStatus,
}

/// Aggregate lead counts for one area, input to the conversion sub-score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadStats {
    /// Total leads recorded in the area.
    pub total: u64,
    /// Leads with status `converted`.
    pub converted: u64,
    /// Leads with status `interested`.
    pub interested: u64,
}

impl LeadStats {
    /// Fraction of leads that converted, 0 when the area has no leads.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn conversion_rate(self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.converted as f64 / self.total as f64
        }
    }

    /// Fraction of leads that showed interest or converted, 0 when the
    /// area has no leads.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn interest_rate(self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.interested + self.converted) as f64 / self.total as f64
        }
    }
}

/// User-configured target demographic, immutable for the duration of a
/// scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPreferences {
    /// Preset profile name this configuration came from, if any.
    pub preset: Option<String>,
    /// Lower bound of the target income range.
    pub income_min: f64,
    /// Upper bound of the target income range.
    pub income_max: f64,
    /// Lower bound of the target home-value range.
    pub home_value_min: f64,
    /// Upper bound of the target home-value range.
    pub home_value_max: f64,
    /// Whether the user targets homeowner-heavy areas.
    pub prefers_homeowners: bool,
}

impl Default for TargetPreferences {
    fn default() -> Self {
        Self {
            preset: None,
            income_min: 50_000.0,
            income_max: 150_000.0,
            home_value_min: 200_000.0,
            home_value_max: 800_000.0,
            prefers_homeowners: true,
        }
    }
}

/// Non-negative weights for the four scoring factors.
///
/// Callers need not supply weights that sum to 1; [`Self::normalized`]
/// divides each by the total before they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight of the income-match sub-score.
    pub income: f64,
    /// Weight of the population-density sub-score.
    pub density: f64,
    /// Weight of the home-value-match sub-score.
    pub home_value: f64,
    /// Weight of the historical-conversion sub-score.
    pub conversion: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            income: 0.30,
            density: 0.20,
            home_value: 0.25,
            conversion: 0.25,
        }
    }
}

impl ScoringWeights {
    /// Sum of the four weights.
    #[must_use]
    pub fn sum(self) -> f64 {
        self.income + self.density + self.home_value + self.conversion
    }

    /// Returns weights scaled to sum to 1.0.
    ///
    /// Weights that sum to zero (or are non-finite) cannot be normalized;
    /// the defaults are substituted so a degenerate input never produces
    /// NaN scores.
    #[must_use]
    pub fn normalized(self) -> Self {
        let sum = self.sum();
        if !(sum.is_finite() && sum > 0.0) {
            return Self::default();
        }
        Self {
            income: self.income / sum,
            density: self.density / sum,
            home_value: self.home_value / sum,
            conversion: self.conversion / sum,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_bounds() {
        assert!(Coordinate::new(43.65, -79.38).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn default_weights_sum_to_one() {
        assert!((ScoringWeights::default().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn normalization_scales_arbitrary_weights() {
        let weights = ScoringWeights {
            income: 3.0,
            density: 2.0,
            home_value: 2.5,
            conversion: 2.5,
        };
        let normalized = weights.normalized();
        assert!((normalized.sum() - 1.0).abs() < 1e-9);
        assert!((normalized.income - 0.3).abs() < 1e-9);
    }

    #[test]
    fn zero_weights_fall_back_to_defaults() {
        let zero = ScoringWeights {
            income: 0.0,
            density: 0.0,
            home_value: 0.0,
            conversion: 0.0,
        };
        assert_eq!(zero.normalized(), ScoringWeights::default());
    }

    #[test]
    fn lead_status_round_trips_snake_case() {
        use std::str::FromStr as _;
        assert_eq!(LeadStatus::NotContacted.to_string(), "not_contacted");
        assert_eq!(
            LeadStatus::from_str("not_home").unwrap(),
            LeadStatus::NotHome
        );
    }

    #[test]
    fn lead_stats_rates() {
        let stats = LeadStats {
            total: 10,
            converted: 2,
            interested: 3,
        };
        assert!((stats.conversion_rate() - 0.2).abs() < 1e-9);
        assert!((stats.interest_rate() - 0.5).abs() < 1e-9);
        assert!((LeadStats::default().conversion_rate()).abs() < f64::EPSILON);
    }
}
