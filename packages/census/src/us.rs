//! US Census Bureau demographic provider.
//!
//! Two-step resolution, both against free endpoints with no API key:
//!
//! 1. `GET /geocoder/geographies/coordinates` — maps a coordinate to the
//!    containing census tract (GEOID plus display names).
//! 2. ACS 5-year statistics query — income, home value, population, and
//!    tenure figures for that tract.
//!
//! Tract population stands in for population density; ACS does not carry
//! land area and the scoring thresholds are calibrated to tract-sized
//! population counts.
//!
//! See <https://geocoding.geo.census.gov/geocoder/Geocoding_Services_API.html>

use async_trait::async_trait;
use turf_scout_neighborhood_models::{Coordinate, RawDemographics};

use crate::{CensusError, DemographicProvider, ResolvedArea};

/// Default base URL for the geographies lookup service.
pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://geocoding.geo.census.gov/geocoder";

/// Default base URL for the ACS 5-year statistics API.
pub const DEFAULT_STATS_BASE_URL: &str = "https://api.census.gov/data/2023/acs/acs5";

/// ACS variables fetched per tract, in query order:
/// median household income, median home value, total population,
/// tenure universe, owner-occupied units.
const ACS_VARIABLES: &str = "B19013_001E,B25077_001E,B01003_001E,B25003_001E,B25003_002E";

/// Tract identity returned by the geographies lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TractInfo {
    /// 11-digit tract GEOID (state + county + tract).
    pub geoid: String,
    /// Tract display name (e.g. "Census Tract 201.02").
    pub name: String,
    /// Containing incorporated place, when the lookup returns one.
    pub city: String,
    /// Two-letter state abbreviation.
    pub state: String,
}

/// US Census Bureau provider: tract lookup plus ACS statistics.
pub struct UsCensusProvider {
    client: reqwest::Client,
    geocoder_base_url: String,
    stats_base_url: String,
}

impl UsCensusProvider {
    /// Creates a provider against the public Census Bureau endpoints.
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
        }
    }

    /// Looks up the census tract containing a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::Resolution`] when no tract covers the
    /// coordinate, or [`CensusError::Http`] / [`CensusError::Parse`] on
    /// transport and decoding failures.
    pub async fn lookup_tract(&self, coordinate: Coordinate) -> Result<TractInfo, CensusError> {
        let url = format!(
            "{base}/geographies/coordinates?x={lon}&y={lat}\
             &benchmark=Public_AR_Current&vintage=Current_Current\
             &layers=Census+Tracts,Incorporated+Places,States&format=json",
            base = self.geocoder_base_url,
            lon = coordinate.longitude,
            lat = coordinate.latitude,
        );

        let resp = self.client.get(&url).send().await?;
        let body: serde_json::Value = resp.json().await?;

        parse_tract_response(&body)
    }

    /// Fetches ACS statistics for a tract GEOID.
    ///
    /// # Errors
    ///
    /// Returns [`CensusError::Http`] / [`CensusError::Parse`] on
    /// transport and decoding failures.
    pub async fn fetch_statistics(&self, geoid: &str) -> Result<RawDemographics, CensusError> {
        let (state, county, tract) = split_geoid(geoid)?;
        let url = format!(
            "{base}?get={vars}&for=tract:{tract}&in=state:{state}%20county:{county}",
            base = self.stats_base_url,
            vars = ACS_VARIABLES,
        );

        let resp = self.client.get(&url).send().await?;
        let body: serde_json::Value = resp.json().await?;

        parse_statistics_response(&body)
    }
}

#[async_trait]
impl DemographicProvider for UsCensusProvider {
    async fn resolve(&self, coordinate: Coordinate) -> Result<ResolvedArea, CensusError> {
        let tract = self.lookup_tract(coordinate).await?;
        let demographics = self.fetch_statistics(&tract.geoid).await?;

        log::info!(
            "Resolved ({}, {}) to tract {} ({})",
            coordinate.latitude,
            coordinate.longitude,
            tract.geoid,
            tract.name
        );

        Ok(ResolvedArea {
            area_id: tract.geoid,
            name: tract.name,
            city: tract.city,
            region: tract.state,
            demographics,
        })
    }
}

/// Parses the geographies lookup response into a [`TractInfo`].
fn parse_tract_response(body: &serde_json::Value) -> Result<TractInfo, CensusError> {
    let geographies = &body["result"]["geographies"];

    let tracts = geographies["Census Tracts"]
        .as_array()
        .ok_or_else(|| CensusError::Parse {
            message: "Missing Census Tracts array".to_string(),
        })?;

    let Some(tract) = tracts.first() else {
        return Err(CensusError::Resolution {
            message: "No census tract covers the coordinate".to_string(),
        });
    };

    let geoid = tract["GEOID"]
        .as_str()
        .ok_or_else(|| CensusError::Parse {
            message: "Missing tract GEOID".to_string(),
        })?
        .to_string();

    let name = tract["NAME"].as_str().unwrap_or_default().to_string();

    let city = geographies["Incorporated Places"]
        .as_array()
        .and_then(|places| places.first())
        .and_then(|place| place["BASENAME"].as_str())
        .unwrap_or_default()
        .to_string();

    let state = geographies["States"]
        .as_array()
        .and_then(|states| states.first())
        .and_then(|state| state["STUSAB"].as_str())
        .unwrap_or_default()
        .to_string();

    Ok(TractInfo {
        geoid,
        name,
        city,
        state,
    })
}

/// Parses the ACS array-of-arrays response (header row, then one data
/// row) into [`RawDemographics`].
fn parse_statistics_response(body: &serde_json::Value) -> Result<RawDemographics, CensusError> {
    let rows = body.as_array().ok_or_else(|| CensusError::Parse {
        message: "ACS response is not an array".to_string(),
    })?;

    let data = rows.get(1).ok_or_else(|| CensusError::Parse {
        message: "ACS response has no data row".to_string(),
    })?;

    let median_income = acs_value(data, 0)?;
    let avg_home_value = acs_value(data, 1)?;
    let population = acs_value(data, 2)?;
    let tenure_total = acs_value(data, 3)?;
    let owner_occupied = acs_value(data, 4)?;

    let ownership_rate = if tenure_total > 0.0 {
        (owner_occupied / tenure_total).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Ok(RawDemographics {
        median_income,
        avg_home_value,
        population_density: population,
        ownership_rate,
        estimated: false,
    })
}

/// Extracts one numeric ACS cell; cells arrive as strings or numbers,
/// and ACS uses large negative sentinels for suppressed values.
fn acs_value(row: &serde_json::Value, index: usize) -> Result<f64, CensusError> {
    let cell = &row[index];
    let value = match cell {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| CensusError::Parse {
        message: format!("ACS cell {index} is not numeric: {cell}"),
    })?;

    // Suppressed/jam values (e.g. -666666666) are reported as 0.
    Ok(if value < 0.0 { 0.0 } else { value })
}

/// Splits an 11-digit GEOID into (state, county, tract) FIPS components.
fn split_geoid(geoid: &str) -> Result<(&str, &str, &str), CensusError> {
    if geoid.len() != 11 || !geoid.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CensusError::Parse {
            message: format!("Invalid tract GEOID: {geoid}"),
        });
    }
    Ok((&geoid[0..2], &geoid[2..5], &geoid[5..11]))
}
