//! Compile-time registry of Canadian census regions.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! A region defines a centroid with a catchment radius for direct
//! coordinate matching, forward-sortation-area (FSA) prefixes for the
//! postal-code fallback, and curated demographic estimates used when the
//! live statistics endpoint fails or returns incomplete data.
//!
//! The estimate figures are human-curated approximations, not computed
//! values; adding a region means creating a TOML file in `regions/` and
//! adding a corresponding entry here.

use serde::Deserialize;

/// Number of registered regions. Updated when new regions are added.
/// Enforced by a test.
#[cfg(test)]
const EXPECTED_REGION_COUNT: usize = 9;

/// Embedded TOML region definitions.
const REGION_TOMLS: &[(&str, &str)] = &[
    (
        "toronto_downtown",
        include_str!("../regions/toronto_downtown.toml"),
    ),
    (
        "toronto_north_york",
        include_str!("../regions/toronto_north_york.toml"),
    ),
    (
        "toronto_scarborough",
        include_str!("../regions/toronto_scarborough.toml"),
    ),
    (
        "toronto_etobicoke",
        include_str!("../regions/toronto_etobicoke.toml"),
    ),
    ("mississauga", include_str!("../regions/mississauga.toml")),
    ("ottawa", include_str!("../regions/ottawa.toml")),
    ("montreal", include_str!("../regions/montreal.toml")),
    ("calgary", include_str!("../regions/calgary.toml")),
    ("vancouver", include_str!("../regions/vancouver.toml")),
];

/// A Canadian census region, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CensusRegion {
    /// Stable region identifier (e.g. `"ca-on-toronto-downtown"`).
    pub id: String,
    /// Human-readable region name.
    pub name: String,
    /// City the region belongs to.
    pub city: String,
    /// Two-letter province abbreviation.
    pub region: String,
    /// Centroid latitude (WGS84).
    pub latitude: f64,
    /// Centroid longitude (WGS84).
    pub longitude: f64,
    /// Catchment radius around the centroid, in kilometres.
    pub radius_km: f64,
    /// Postal-code prefixes (1–3 characters) that map to this region.
    pub fsa_prefixes: Vec<String>,
    /// Curated fallback figures for when live statistics are unavailable.
    pub estimates: RegionEstimates,
}

/// Curated demographic estimates for one region.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegionEstimates {
    /// Median household income (CAD).
    pub median_income: f64,
    /// Average home value (CAD).
    pub avg_home_value: f64,
    /// Population-density proxy, tract-scale people count.
    pub population_density: f64,
    /// Home-ownership rate in [0, 1].
    pub ownership_rate: f64,
}

/// Returns all registered Canadian regions.
///
/// # Panics
///
/// Panics if any embedded TOML file fails to parse. Since these are
/// compile-time constants, parse failures indicate a development error
/// and are caught during CI.
#[must_use]
pub fn all_regions() -> Vec<CensusRegion> {
    REGION_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str)
                .unwrap_or_else(|e| panic!("Failed to parse census region '{name}': {e}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_regions() {
        let regions = all_regions();
        assert_eq!(
            regions.len(),
            EXPECTED_REGION_COUNT,
            "Expected {EXPECTED_REGION_COUNT} census regions, found {}. \
             Update EXPECTED_REGION_COUNT after adding/removing regions.",
            regions.len()
        );
    }

    #[test]
    fn region_ids_are_unique() {
        let regions = all_regions();
        let mut seen = BTreeSet::new();
        for region in &regions {
            assert!(
                seen.insert(&region.id),
                "Duplicate census region ID: {}",
                region.id
            );
        }
    }

    #[test]
    fn all_regions_have_sane_fields() {
        for region in &all_regions() {
            assert!(!region.id.is_empty(), "Region has empty id");
            assert!(!region.name.is_empty(), "Region {} has empty name", region.id);
            assert!(
                region.region.len() == 2,
                "Region {} has invalid province: {}",
                region.id,
                region.region
            );
            assert!(
                region.radius_km > 0.0,
                "Region {} has non-positive radius",
                region.id
            );
            assert!(
                !region.fsa_prefixes.is_empty(),
                "Region {} has no FSA prefixes",
                region.id
            );
            assert!(
                (0.0..=1.0).contains(&region.estimates.ownership_rate),
                "Region {} ownership rate out of range",
                region.id
            );
        }
    }

    #[test]
    fn region_centroids_are_inside_the_canada_box() {
        for region in &all_regions() {
            let coordinate = turf_scout_neighborhood_models::Coordinate::new(
                region.latitude,
                region.longitude,
            );
            assert!(
                crate::in_canada(coordinate),
                "Region {} centroid falls outside the Canada routing box",
                region.id
            );
        }
    }
}
