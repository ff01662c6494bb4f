//! Suitability scoring: four weighted sub-scores combined into a 0–100
//! composite.
//!
//! Each sub-score is independently scaled to [0, 100]; the composite is
//! their weighted average after the caller's weights are normalized to
//! sum to 1. All functions here are pure; persistence of the computed
//! score is the service's job.

use turf_scout_neighborhood_models::{
    GeographicArea, LeadStats, ScoringWeights, TargetPreferences,
};

/// Income gap (in currency units) over which the income sub-score decays
/// from 100 to 50 outside the target range.
const INCOME_BUFFER: f64 = 50_000.0;

/// Home-value gap over which the home-value sub-score decays from 100
/// to 50 outside the target range.
const HOME_VALUE_BUFFER: f64 = 100_000.0;

/// Density band that scores a full 100.
const DENSITY_IDEAL: (f64, f64) = (2000.0, 8000.0);

/// A value inside `[min, max]` scores 100; outside, the score drops by
/// 50 points per `buffer` units of distance to the nearer bound,
/// clamped at 0.
fn range_score(value: f64, min: f64, max: f64, buffer: f64) -> f64 {
    if (min..=max).contains(&value) {
        return 100.0;
    }
    let gap = if value < min { min - value } else { value - max };
    (100.0 - 50.0 * (gap / buffer)).max(0.0)
}

/// Income-match sub-score against the preference range.
#[must_use]
pub fn income_score(median_income: f64, preferences: &TargetPreferences) -> f64 {
    range_score(
        median_income,
        preferences.income_min,
        preferences.income_max,
        INCOME_BUFFER,
    )
}

/// Home-value-match sub-score against the preference range.
#[must_use]
pub fn home_value_score(avg_home_value: f64, preferences: &TargetPreferences) -> f64 {
    range_score(
        avg_home_value,
        preferences.home_value_min,
        preferences.home_value_max,
        HOME_VALUE_BUFFER,
    )
}

/// Population-density sub-score.
///
/// The ideal band scores 100. Sparser areas scale linearly down to 0 at
/// zero density; denser areas decay but never drop below 50 — dense
/// urban cores stay door-knockable.
#[must_use]
pub fn density_score(density: f64) -> f64 {
    let (low, high) = DENSITY_IDEAL;
    if density < low {
        (100.0 * (density / low)).max(0.0)
    } else if density <= high {
        100.0
    } else {
        (100.0 - 50.0 * ((density - high) / 10_000.0)).max(50.0)
    }
}

/// Historical-conversion sub-score from per-area lead outcomes.
///
/// An area with no recorded leads scores a neutral 50. Otherwise the
/// conversion rate dominates (70%) with interest contributing the rest,
/// plus a small sample-size boost so ten decided leads outrank one
/// lucky door.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn conversion_score(stats: LeadStats) -> f64 {
    if stats.total == 0 {
        return 50.0;
    }

    let base = stats.conversion_rate() * 70.0 + stats.interest_rate() * 30.0;
    let boost = (stats.total as f64 / 2.0).min(10.0);
    (base + boost).clamp(0.0, 100.0)
}

/// Combines the four sub-scores for an area into the composite
/// suitability score, weighted by the normalized weights.
#[must_use]
pub fn composite_score(
    area: &GeographicArea,
    preferences: &TargetPreferences,
    weights: &ScoringWeights,
    stats: LeadStats,
) -> f64 {
    if !(weights.sum().is_finite() && weights.sum() > 0.0) {
        log::warn!("Degenerate scoring weights {weights:?}, falling back to defaults");
    }
    let weights = weights.normalized();

    let income = income_score(area.median_income, preferences);
    let home_value = home_value_score(area.avg_home_value, preferences);
    let density = density_score(area.population_density);
    let conversion = conversion_score(stats);

    let total = income * weights.income
        + density * weights.density
        + home_value * weights.home_value
        + conversion * weights.conversion;

    log::debug!(
        "Scored {}: income={income:.1} density={density:.1} \
         home_value={home_value:.1} conversion={conversion:.1} total={total:.1}",
        area.area_id
    );

    total.clamp(0.0, 100.0)
}
