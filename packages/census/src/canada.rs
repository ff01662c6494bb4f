//! Canadian demographic provider.
//!
//! Canada has no free coordinate-to-tract service comparable to the US
//! Census geocoder, so resolution is a three-step fallback chain:
//!
//! 1. **Nearest centroid** — match the coordinate against the embedded
//!    region table ([`crate::registry`]) by haversine distance, accepting
//!    the closest region whose catchment radius covers the point.
//! 2. **Postal code (FSA)** — reverse-geocode the coordinate to a postal
//!    code and match its forward sortation area against the regions'
//!    prefix tables (longest prefix wins).
//! 3. **Default region** — a hardcoded identifier, so a Canadian
//!    coordinate never fails to resolve.
//!
//! Statistics come from a live profile endpoint when available; on any
//! failure or incomplete payload the region's curated estimates are
//! substituted and flagged as such. This is a deliberate
//! degrade-gracefully policy for a data source that is flaky in practice.

use async_trait::async_trait;
use geo::{Distance, Haversine, Point};
use turf_scout_neighborhood_models::{Coordinate, RawDemographics};

use crate::registry::{CensusRegion, all_regions};
use crate::{CensusError, DemographicProvider, ResolvedArea};

/// Default base URL for the reverse-geocoding service.
pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://geocoder.ca";

/// Default base URL for the regional statistics service.
pub const DEFAULT_STATS_BASE_URL: &str = "https://www12.statcan.gc.ca/rest";

/// Region used when neither centroid nor postal matching succeeds.
pub const DEFAULT_REGION_ID: &str = "ca-on-toronto-downtown";

/// Canadian provider: embedded region table plus live statistics with
/// curated estimate fallback.
pub struct CanadaProvider {
    client: reqwest::Client,
    geocoder_base_url: String,
    stats_base_url: String,
    regions: Vec<CensusRegion>,
}

impl CanadaProvider {
    /// Creates a provider against the default endpoints.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_urls(client, DEFAULT_GEOCODER_BASE_URL, DEFAULT_STATS_BASE_URL)
    }

    /// Creates a provider with custom base URLs (used by tests).
    #[must_use]
    pub fn with_base_urls(
        client: reqwest::Client,
        geocoder_base_url: &str,
        stats_base_url: &str,
    ) -> Self {
        Self {
            client,
            geocoder_base_url: geocoder_base_url.trim_end_matches('/').to_string(),
            stats_base_url: stats_base_url.trim_end_matches('/').to_string(),
            regions: all_regions(),
        }
    }

    /// Finds the closest region whose catchment radius covers the
    /// coordinate.
    #[must_use]
    pub fn nearest_centroid(&self, coordinate: Coordinate) -> Option<&CensusRegion> {
        self.regions
            .iter()
            .map(|region| {
                let km = distance_km(
                    coordinate,
                    Coordinate::new(region.latitude, region.longitude),
                );
                (region, km)
            })
            .filter(|(region, km)| *km <= region.radius_km)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(region, _)| region)
    }

    /// Matches a forward sortation area against the regions' prefix
    /// tables. The longest matching prefix wins, so `"M2N"` prefers a
    /// region listing `"M2"` over one listing `"M"`.
    #[must_use]
    pub fn region_for_fsa(&self, fsa: &str) -> Option<&CensusRegion> {
        let fsa = fsa.to_ascii_uppercase();
        self.regions
            .iter()
            .filter_map(|region| {
                region
                    .fsa_prefixes
                    .iter()
                    .filter(|prefix| fsa.starts_with(&prefix.to_ascii_uppercase()))
                    .map(|prefix| (region, prefix.len()))
                    .max_by_key(|(_, len)| *len)
            })
            .max_by_key(|(_, len)| *len)
            .map(|(region, _)| region)
    }

    /// Returns the hardcoded default region.
    ///
    /// # Panics
    ///
    /// Panics if [`DEFAULT_REGION_ID`] is missing from the embedded
    /// table, which is a development error caught by tests.
    #[must_use]
    pub fn default_region(&self) -> &CensusRegion {
        self.regions
            .iter()
            .find(|region| region.id == DEFAULT_REGION_ID)
            .unwrap_or_else(|| panic!("Default region {DEFAULT_REGION_ID} not registered"))
    }

    /// Curated estimates for an area identifier, matched by substring so
    /// tract-style identifiers that embed a region key still resolve.
    #[must_use]
    pub fn estimate_for(&self, area_id: &str) -> Option<RawDemographics> {
        self.regions
            .iter()
            .find(|region| area_id.contains(&region.id) || region.id.contains(area_id))
            .map(|region| RawDemographics {
                median_income: region.estimates.median_income,
                avg_home_value: region.estimates.avg_home_value,
                population_density: region.estimates.population_density,
                ownership_rate: region.estimates.ownership_rate,
                estimated: true,
            })
    }

    /// Reverse-geocodes a coordinate to a postal code.
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::Http`] / [`CensusError::Parse`] on
    /// transport and decoding failures.
    pub async fn reverse_geocode_postal(
        &self,
        coordinate: Coordinate,
    ) -> Result<String, CensusError> {
        let url = format!(
            "{base}/?latt={lat}&longt={lon}&reverse=1&geoit=JSON",
            base = self.geocoder_base_url,
            lat = coordinate.latitude,
            lon = coordinate.longitude,
        );

        let resp = self.client.get(&url).send().await?;
        let body: serde_json::Value = resp.json().await?;

        parse_postal_response(&body)
    }

    /// Fetches live statistics for a region identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::Http`] / [`CensusError::Parse`] on
    /// transport failures or incomplete payloads; callers substitute
    /// curated estimates on error.
    pub async fn fetch_statistics(&self, region_id: &str) -> Result<RawDemographics, CensusError> {
        let url = format!(
            "{base}/region/{region_id}/profile?format=json",
            base = self.stats_base_url,
        );

        let resp = self.client.get(&url).send().await?;
        let body: serde_json::Value = resp.json().await?;

        parse_profile_response(&body)
    }

    /// Resolves the coordinate to a region via the centroid → FSA →
    /// default chain.
    async fn match_region(&self, coordinate: Coordinate) -> &CensusRegion {
        if let Some(region) = self.nearest_centroid(coordinate) {
            return region;
        }

        match self.reverse_geocode_postal(coordinate).await {
            Ok(postal) => {
                let fsa: String = postal.chars().take(3).collect();
                if let Some(region) = self.region_for_fsa(&fsa) {
                    return region;
                }
                log::warn!("No region for FSA {fsa}, using default region");
            }
            Err(e) => {
                log::warn!("Reverse geocoding failed ({e}), using default region");
            }
        }

        self.default_region()
    }
}

#[async_trait]
impl DemographicProvider for CanadaProvider {
    async fn resolve(&self, coordinate: Coordinate) -> Result<ResolvedArea, CensusError> {
        let region = self.match_region(coordinate).await;

        let demographics = match self.fetch_statistics(&region.id).await {
            Ok(stats) => stats,
            Err(e) => {
                log::warn!(
                    "Live statistics unavailable for {} ({e}), using curated estimates",
                    region.id
                );
                self.estimate_for(&region.id)
                    .ok_or_else(|| CensusError::Resolution {
                        message: format!("No estimates registered for region {}", region.id),
                    })?
            }
        };

        log::info!(
            "Resolved ({}, {}) to region {} ({})",
            coordinate.latitude,
            coordinate.longitude,
            region.id,
            region.name
        );

        Ok(ResolvedArea {
            area_id: region.id.clone(),
            name: region.name.clone(),
            city: region.city.clone(),
            region: region.region.clone(),
            demographics,
        })
    }
}

/// Haversine distance between two coordinates, in kilometres.
#[must_use]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let a = Point::new(a.longitude, a.latitude);
    let b = Point::new(b.longitude, b.latitude);
    Haversine.distance(a, b) / 1000.0
}

/// Parses a reverse-geocoding response into a postal code.
fn parse_postal_response(body: &serde_json::Value) -> Result<String, CensusError> {
    let postal = body["postal"].as_str().ok_or_else(|| CensusError::Parse {
        message: "Missing postal field".to_string(),
    })?;

    let trimmed = postal.trim();
    if trimmed.len() < 3 {
        return Err(CensusError::Parse {
            message: format!("Postal code too short: {trimmed:?}"),
        });
    }

    Ok(trimmed.to_ascii_uppercase())
}

/// Parses a live region profile into [`RawDemographics`]. A payload
/// missing any figure is treated as incomplete so the caller can fall
/// back to curated estimates.
fn parse_profile_response(body: &serde_json::Value) -> Result<RawDemographics, CensusError> {
    let field = |name: &str| -> Result<f64, CensusError> {
        body[name]
            .as_f64()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .ok_or_else(|| CensusError::Parse {
                message: format!("Profile missing field {name}"),
            })
    };

    Ok(RawDemographics {
        median_income: field("median_income")?,
        avg_home_value: field("avg_home_value")?,
        population_density: field("population_density")?,
        ownership_rate: field("ownership_rate")?.clamp(0.0, 1.0),
        estimated: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> CanadaProvider {
        CanadaProvider::new(reqwest::Client::new())
    }

    #[test]
    fn toronto_matches_downtown_centroid() {
        let provider = provider();
        let region = provider
            .nearest_centroid(Coordinate::new(43.65, -79.38))
            .expect("downtown Toronto should match a centroid");
        assert_eq!(region.id, "ca-on-toronto-downtown");
    }

    #[test]
    fn remote_coordinate_matches_no_centroid() {
        // Thunder Bay is hundreds of kilometres from every catchment.
        assert!(
            provider()
                .nearest_centroid(Coordinate::new(48.38, -89.25))
                .is_none()
        );
    }

    #[test]
    fn fsa_longest_prefix_wins() {
        let provider = provider();
        assert_eq!(
            provider.region_for_fsa("M2N").unwrap().id,
            "ca-on-toronto-north-york"
        );
        assert_eq!(
            provider.region_for_fsa("m5v").unwrap().id,
            "ca-on-toronto-downtown"
        );
        // Montreal matches on the single-letter district prefix.
        assert_eq!(provider.region_for_fsa("H3B").unwrap().id, "ca-qc-montreal");
        assert!(provider.region_for_fsa("X0A").is_none());
    }

    #[test]
    fn default_region_is_registered() {
        assert_eq!(provider().default_region().id, DEFAULT_REGION_ID);
    }

    #[test]
    fn estimates_match_by_substring() {
        let provider = provider();
        let estimate = provider
            .estimate_for("ca-on-toronto-scarborough-0042")
            .expect("tract-style id should match by substring");
        assert!(estimate.estimated);
        assert!((estimate.median_income - 72_000.0).abs() < f64::EPSILON);
        assert!(provider.estimate_for("us-somewhere").is_none());
    }

    #[test]
    fn parses_postal_response() {
        let body = serde_json::json!({ "postal": "m5h2n2" });
        assert_eq!(parse_postal_response(&body).unwrap(), "M5H2N2");

        let body = serde_json::json!({ "postal": "M" });
        assert!(parse_postal_response(&body).is_err());

        let body = serde_json::json!({});
        assert!(parse_postal_response(&body).is_err());
    }

    #[test]
    fn incomplete_profile_is_parse_error() {
        let body = serde_json::json!({
            "median_income": 88000.0,
            "avg_home_value": 950000.0
        });
        assert!(matches!(
            parse_profile_response(&body),
            Err(CensusError::Parse { .. })
        ));
    }

    #[test]
    fn complete_profile_parses() {
        let body = serde_json::json!({
            "median_income": 88000.0,
            "avg_home_value": 950000.0,
            "population_density": 7200.0,
            "ownership_rate": 0.38
        });
        let stats = parse_profile_response(&body).unwrap();
        assert!(!stats.estimated);
        assert!((stats.ownership_rate - 0.38).abs() < 1e-9);
    }

    #[test]
    fn distance_toronto_to_mississauga() {
        let km = distance_km(
            Coordinate::new(43.6532, -79.3832),
            Coordinate::new(43.589, -79.6441),
        );
        assert!((15.0..30.0).contains(&km), "unexpected distance {km}");
    }
}
