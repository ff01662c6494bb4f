//! Lead storage and per-area conversion statistics.
//!
//! Leads are owned by the host application; it hands them to the store
//! so the conversion sub-score can aggregate outcomes per area.

use duckdb::Connection;
use turf_scout_neighborhood_models::{Lead, LeadStats};

use crate::DbError;

/// Inserts a lead, or updates its status and area if it already exists.
///
/// # Errors
///
/// Returns [`DbError`] if the insert fails.
pub fn upsert_lead(conn: &Connection, lead: &Lead) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO leads (id, area_id, status) VALUES (?, ?, ?)
         ON CONFLICT (id) DO UPDATE SET
            area_id = excluded.area_id,
            status = excluded.status",
        duckdb::params![lead.id, lead.area_id, lead.status.to_string()],
    )?;
    Ok(())
}

/// Aggregates lead outcomes for one area.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn lead_stats(conn: &Connection, area_id: &str) -> Result<LeadStats, DbError> {
    let mut stmt = conn.prepare(
        "SELECT
            COUNT(*),
            COUNT(*) FILTER (WHERE status = 'converted'),
            COUNT(*) FILTER (WHERE status = 'interested')
         FROM leads WHERE area_id = ?",
    )?;
    let mut rows = stmt.query(duckdb::params![area_id])?;

    let Some(row) = rows.next()? else {
        return Ok(LeadStats::default());
    };

    let total: i64 = row.get(0)?;
    let converted: i64 = row.get(1)?;
    let interested: i64 = row.get(2)?;

    #[allow(clippy::cast_sign_loss)]
    Ok(LeadStats {
        total: total as u64,
        converted: converted as u64,
        interested: interested as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_in_memory;
    use turf_scout_neighborhood_models::LeadStatus;

    fn lead(id: &str, area_id: &str, status: LeadStatus) -> Lead {
        Lead {
            id: id.to_string(),
            area_id: area_id.to_string(),
            status,
        }
    }

    #[test]
    fn stats_for_area_without_leads_are_zero() {
        let conn = open_in_memory().unwrap();
        assert_eq!(lead_stats(&conn, "empty").unwrap(), LeadStats::default());
    }

    #[test]
    fn stats_count_by_status() {
        let conn = open_in_memory().unwrap();
        upsert_lead(&conn, &lead("l1", "a1", LeadStatus::Converted)).unwrap();
        upsert_lead(&conn, &lead("l2", "a1", LeadStatus::Interested)).unwrap();
        upsert_lead(&conn, &lead("l3", "a1", LeadStatus::NotHome)).unwrap();
        upsert_lead(&conn, &lead("l4", "a2", LeadStatus::Converted)).unwrap();

        let stats = lead_stats(&conn, "a1").unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.converted, 1);
        assert_eq!(stats.interested, 1);
    }

    #[test]
    fn re_upserting_a_lead_updates_its_status() {
        let conn = open_in_memory().unwrap();
        upsert_lead(&conn, &lead("l1", "a1", LeadStatus::NotContacted)).unwrap();
        upsert_lead(&conn, &lead("l1", "a1", LeadStatus::Converted)).unwrap();

        let stats = lead_stats(&conn, "a1").unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.converted, 1);
    }
}
