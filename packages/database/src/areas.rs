//! Area cache queries: approximate coordinate lookup, upsert, score
//! update, and ranked reads.

use chrono::{DateTime, Duration, Utc};
use duckdb::Connection;
use turf_scout_neighborhood_models::{Coordinate, GeographicArea};

use crate::{CacheConfig, DbError};

const AREA_COLUMNS: &str = "area_id, name, city, region, latitude, longitude, \
     median_income, avg_home_value, population_density, ownership_rate, \
     score, last_updated";

/// Looks up the cached area whose center lies within the configured
/// bounding box of `coordinate` and whose `last_updated` is inside the
/// freshness window ending at `now`.
///
/// Expired matches are treated as absent, not deleted; when several
/// fresh rows overlap the box the most recently updated one wins.
///
/// # Errors
///
/// Returns [`DbError`] if the query or row decoding fails.
pub fn lookup_near(
    conn: &Connection,
    coordinate: Coordinate,
    config: &CacheConfig,
    now: DateTime<Utc>,
) -> Result<Option<GeographicArea>, DbError> {
    let cutoff = (now - Duration::days(config.ttl_days)).timestamp();

    let sql = format!(
        "SELECT {AREA_COLUMNS} FROM neighborhoods
         WHERE latitude BETWEEN ? AND ?
           AND longitude BETWEEN ? AND ?
           AND last_updated >= ?
         ORDER BY last_updated DESC
         LIMIT 1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(duckdb::params![
        coordinate.latitude - config.tolerance_deg,
        coordinate.latitude + config.tolerance_deg,
        coordinate.longitude - config.tolerance_deg,
        coordinate.longitude + config.tolerance_deg,
        cutoff,
    ])?;

    match rows.next()? {
        Some(row) => Ok(Some(area_from_row(row)?)),
        None => Ok(None),
    }
}

/// Inserts a new area or overwrites the fields of an existing one,
/// always stamping `last_updated = now`.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub fn upsert(conn: &Connection, area: &GeographicArea, now: DateTime<Utc>) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO neighborhoods (
            area_id, name, city, region, latitude, longitude,
            median_income, avg_home_value, population_density,
            ownership_rate, score, last_updated
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (area_id) DO UPDATE SET
            name = excluded.name,
            city = excluded.city,
            region = excluded.region,
            latitude = excluded.latitude,
            longitude = excluded.longitude,
            median_income = excluded.median_income,
            avg_home_value = excluded.avg_home_value,
            population_density = excluded.population_density,
            ownership_rate = excluded.ownership_rate,
            score = excluded.score,
            last_updated = excluded.last_updated",
        duckdb::params![
            area.area_id,
            area.name,
            area.city,
            area.region,
            area.latitude,
            area.longitude,
            area.median_income,
            area.avg_home_value,
            area.population_density,
            area.ownership_rate,
            area.score,
            now.timestamp(),
        ],
    )?;
    Ok(())
}

/// Persists a freshly computed score for an area without touching its
/// demographic fields or freshness timestamp.
///
/// # Errors
///
/// Returns [`DbError`] if the update fails, or a `Conversion` error if
/// the area is not in the store.
pub fn update_score(conn: &Connection, area_id: &str, score: f64) -> Result<(), DbError> {
    let updated = conn.execute(
        "UPDATE neighborhoods SET score = ? WHERE area_id = ?",
        duckdb::params![score, area_id],
    )?;

    if updated == 0 {
        return Err(DbError::Conversion {
            message: format!("No cached area with id {area_id}"),
        });
    }
    Ok(())
}

/// Returns up to `limit` areas ordered by score descending, ties broken
/// by insertion order.
///
/// # Errors
///
/// Returns [`DbError`] if the query or row decoding fails.
pub fn top_by_score(conn: &Connection, limit: u64) -> Result<Vec<GeographicArea>, DbError> {
    let sql = format!(
        "SELECT {AREA_COLUMNS} FROM neighborhoods
         ORDER BY score DESC, rowid
         LIMIT ?"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(duckdb::params![limit])?;

    let mut areas = Vec::new();
    while let Some(row) = rows.next()? {
        areas.push(area_from_row(row)?);
    }
    Ok(areas)
}

/// Returns every cached area, in insertion order. Used by batch
/// rescoring and the nearest-area scan.
///
/// # Errors
///
/// Returns [`DbError`] if the query or row decoding fails.
pub fn all_areas(conn: &Connection) -> Result<Vec<GeographicArea>, DbError> {
    let sql = format!("SELECT {AREA_COLUMNS} FROM neighborhoods ORDER BY rowid");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;

    let mut areas = Vec::new();
    while let Some(row) = rows.next()? {
        areas.push(area_from_row(row)?);
    }
    Ok(areas)
}

fn area_from_row(row: &duckdb::Row<'_>) -> Result<GeographicArea, DbError> {
    let epoch: i64 = row.get(11)?;
    let last_updated =
        DateTime::<Utc>::from_timestamp(epoch, 0).ok_or_else(|| DbError::Conversion {
            message: format!("Invalid last_updated timestamp: {epoch}"),
        })?;

    Ok(GeographicArea {
        area_id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        region: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        median_income: row.get(6)?,
        avg_home_value: row.get(7)?,
        population_density: row.get(8)?,
        ownership_rate: row.get(9)?,
        score: row.get(10)?,
        last_updated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_in_memory;

    fn area(id: &str, lat: f64, lon: f64, score: f64) -> GeographicArea {
        GeographicArea {
            area_id: id.to_string(),
            name: format!("Area {id}"),
            city: "Testville".to_string(),
            region: "TS".to_string(),
            latitude: lat,
            longitude: lon,
            median_income: 80_000.0,
            avg_home_value: 500_000.0,
            population_density: 4000.0,
            ownership_rate: 0.6,
            score,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn upsert_then_lookup_within_tolerance() {
        let conn = open_in_memory().unwrap();
        let now = Utc::now();
        upsert(&conn, &area("a1", 43.65, -79.38, 0.0), now).unwrap();

        let hit = lookup_near(
            &conn,
            Coordinate::new(43.655, -79.375),
            &CacheConfig::default(),
            now,
        )
        .unwrap();
        assert_eq!(hit.unwrap().area_id, "a1");
    }

    #[test]
    fn lookup_outside_tolerance_misses() {
        let conn = open_in_memory().unwrap();
        let now = Utc::now();
        upsert(&conn, &area("a1", 43.65, -79.38, 0.0), now).unwrap();

        let miss = lookup_near(
            &conn,
            Coordinate::new(43.70, -79.38),
            &CacheConfig::default(),
            now,
        )
        .unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn expired_rows_are_treated_as_absent() {
        let conn = open_in_memory().unwrap();
        let now = Utc::now();
        let stale = now - Duration::days(31);
        upsert(&conn, &area("a1", 43.65, -79.38, 0.0), stale).unwrap();

        let config = CacheConfig::default();
        let miss = lookup_near(&conn, Coordinate::new(43.65, -79.38), &config, now).unwrap();
        assert!(miss.is_none());

        // The row is still there; a re-upsert refreshes it in place.
        upsert(&conn, &area("a1", 43.65, -79.38, 0.0), now).unwrap();
        let hit = lookup_near(&conn, Coordinate::new(43.65, -79.38), &config, now).unwrap();
        assert!(hit.is_some());
        assert_eq!(all_areas(&conn).unwrap().len(), 1);
    }

    #[test]
    fn upsert_overwrites_fields() {
        let conn = open_in_memory().unwrap();
        let now = Utc::now();
        upsert(&conn, &area("a1", 43.65, -79.38, 10.0), now).unwrap();

        let mut updated = area("a1", 43.65, -79.38, 10.0);
        updated.median_income = 99_000.0;
        upsert(&conn, &updated, now).unwrap();

        let areas = all_areas(&conn).unwrap();
        assert_eq!(areas.len(), 1);
        assert!((areas[0].median_income - 99_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn update_score_persists() {
        let conn = open_in_memory().unwrap();
        let now = Utc::now();
        upsert(&conn, &area("a1", 43.65, -79.38, 0.0), now).unwrap();

        update_score(&conn, "a1", 73.5).unwrap();
        let areas = all_areas(&conn).unwrap();
        assert!((areas[0].score - 73.5).abs() < f64::EPSILON);

        assert!(matches!(
            update_score(&conn, "missing", 1.0),
            Err(DbError::Conversion { .. })
        ));
    }

    #[test]
    fn top_by_score_orders_descending() {
        let conn = open_in_memory().unwrap();
        let now = Utc::now();
        for (i, score) in [90.0, 10.0, 50.0, 70.0, 30.0].into_iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let lat = 40.0 + i as f64;
            upsert(&conn, &area(&format!("a{i}"), lat, -70.0, score), now).unwrap();
        }

        let top = top_by_score(&conn, 3).unwrap();
        let scores: Vec<f64> = top.iter().map(|a| a.score).collect();
        assert_eq!(scores, vec![90.0, 70.0, 50.0]);
    }
}
