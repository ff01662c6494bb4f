//! The caller-facing neighborhood service.
//!
//! Owns the cache store connection and a demographic provider, both
//! injected at construction. Every mutation of the store goes through
//! this one object, so a service instance behaves as a single logical
//! actor; concurrent lookups for different coordinates belong to
//! different instances or are serialized by the caller.

use chrono::{Duration, Utc};
use duckdb::Connection;
use turf_scout_census::DemographicProvider;
use turf_scout_database::{CacheConfig, areas, leads};
use turf_scout_neighborhood_models::{
    Coordinate, GeographicArea, Lead, ScoringWeights, TargetPreferences,
};

use crate::{EngineError, scoring};

/// Orchestrates cache lookups, demographic fetches, scoring, and
/// ranking for the host application.
pub struct NeighborhoodService {
    conn: Connection,
    provider: Box<dyn DemographicProvider>,
    config: CacheConfig,
}

impl NeighborhoodService {
    /// Creates a service with the default cache policy.
    #[must_use]
    pub fn new(conn: Connection, provider: Box<dyn DemographicProvider>) -> Self {
        Self::with_config(conn, provider, CacheConfig::default())
    }

    /// Creates a service with an explicit cache policy.
    #[must_use]
    pub const fn with_config(
        conn: Connection,
        provider: Box<dyn DemographicProvider>,
        config: CacheConfig,
    ) -> Self {
        Self {
            conn,
            provider,
            config,
        }
    }

    /// Returns the cached area covering the coordinate, fetching and
    /// caching a new one on miss.
    ///
    /// A cache hit performs no network call; this is the idempotence
    /// guarantee the UI layer relies on when the map re-queries the
    /// same position.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidCoordinate`] for out-of-range
    /// input, [`EngineError::Fetch`] when the provider fails, and
    /// [`EngineError::Persistence`] when the store does.
    pub async fn fetch_area(&self, coordinate: Coordinate) -> Result<GeographicArea, EngineError> {
        if !coordinate.is_valid() {
            return Err(EngineError::InvalidCoordinate {
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
            });
        }

        let now = Utc::now();
        if let Some(cached) = areas::lookup_near(&self.conn, coordinate, &self.config, now)? {
            log::debug!(
                "Cache hit for ({}, {}): {}",
                coordinate.latitude,
                coordinate.longitude,
                cached.area_id
            );
            return Ok(cached);
        }

        self.resolve_and_store(coordinate).await
    }

    /// Re-runs the full fetch for an area whose figures are older than
    /// the freshness window; returns the area unchanged otherwise.
    ///
    /// Never triggered automatically — the host decides when a stale
    /// area is worth a refresh.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::fetch_area`].
    pub async fn refresh_if_stale(
        &self,
        area: &GeographicArea,
    ) -> Result<GeographicArea, EngineError> {
        let age = Utc::now() - area.last_updated;
        if age <= Duration::days(self.config.ttl_days) {
            return Ok(area.clone());
        }

        log::info!(
            "Area {} is {} days old, refreshing",
            area.area_id,
            age.num_days()
        );
        self.resolve_and_store(area.coordinate()).await
    }

    /// Computes the suitability score for an area, writes it into
    /// `area.score`, and persists it.
    ///
    /// On a persistence failure the in-memory score is already set when
    /// the error propagates; the caller keeps the computed value but
    /// must not assume it is durable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Persistence`] if reading lead statistics
    /// or writing the score fails.
    pub fn score_area(
        &self,
        area: &mut GeographicArea,
        preferences: &TargetPreferences,
        weights: &ScoringWeights,
    ) -> Result<f64, EngineError> {
        let stats = leads::lead_stats(&self.conn, &area.area_id)?;
        let total = scoring::composite_score(area, preferences, weights, stats);

        area.score = total;
        areas::update_score(&self.conn, &area.area_id, total)?;
        Ok(total)
    }

    /// Re-scores every cached area sequentially.
    ///
    /// Fail-fast: the first error aborts the remaining batch. Pacing is
    /// intentionally one area at a time.
    ///
    /// # Errors
    ///
    /// Propagates the first [`EngineError`] encountered.
    pub fn recalculate_all(
        &self,
        preferences: &TargetPreferences,
        weights: &ScoringWeights,
    ) -> Result<usize, EngineError> {
        let mut scored = 0;
        for mut area in areas::all_areas(&self.conn)? {
            self.score_area(&mut area, preferences, weights)?;
            scored += 1;
        }
        log::info!("Re-scored {scored} cached areas");
        Ok(scored)
    }

    /// Returns up to `limit` areas by score, best first. A non-positive
    /// limit yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Persistence`] if the query fails.
    pub fn top_n(&self, limit: i64) -> Result<Vec<GeographicArea>, EngineError> {
        if limit <= 0 {
            return Ok(Vec::new());
        }
        #[allow(clippy::cast_sign_loss)]
        let limit = limit as u64;
        Ok(areas::top_by_score(&self.conn, limit)?)
    }

    /// Returns the cached area nearest to the coordinate by great-circle
    /// distance, or `None` when the cache is empty. Linear scan; the
    /// cache holds at most a few hundred areas.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Persistence`] if the scan fails.
    pub fn nearest(&self, coordinate: Coordinate) -> Result<Option<GeographicArea>, EngineError> {
        let nearest = areas::all_areas(&self.conn)?
            .into_iter()
            .map(|area| {
                let km = turf_scout_census::canada::distance_km(coordinate, area.coordinate());
                (area, km)
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(area, _)| area);
        Ok(nearest)
    }

    /// Records a lead outcome for conversion scoring. Lead records are
    /// owned by the host; the engine only aggregates them.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Persistence`] if the write fails.
    pub fn record_lead(&self, lead: &Lead) -> Result<(), EngineError> {
        Ok(leads::upsert_lead(&self.conn, lead)?)
    }

    async fn resolve_and_store(
        &self,
        coordinate: Coordinate,
    ) -> Result<GeographicArea, EngineError> {
        let resolved = self.provider.resolve(coordinate).await?;
        let now = Utc::now();

        let area = GeographicArea {
            area_id: resolved.area_id,
            name: resolved.name,
            city: resolved.city,
            region: resolved.region,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            median_income: resolved.demographics.median_income,
            avg_home_value: resolved.demographics.avg_home_value,
            population_density: resolved.demographics.population_density,
            ownership_rate: resolved.demographics.ownership_rate,
            score: 0.0,
            last_updated: now,
        };

        areas::upsert(&self.conn, &area, now)?;
        log::info!("Cached area {} for ({}, {})", area.area_id, area.latitude, area.longitude);
        Ok(area)
    }
}
