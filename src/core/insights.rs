//! Insights: fetch the three aggregates for a date range and the helpers
//! used to draw them.

use crate::api::{InsightsFilters, ReportApi};
use crate::errors::{AppError, AppResult};
use crate::models::insights::{Patterns, RoleHours, RoleHoursReport, TagDistribution};
use crate::utils::date::days_before;
use chrono::NaiveDate;

pub const DEFAULT_RANGE_DAYS: u64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct InsightsReport {
    pub filters: InsightsFilters,
    pub role_hours: RoleHoursReport,
    pub tags: TagDistribution,
    pub patterns: Patterns,
}

/// The last seven days up to `today`.
pub fn default_filters(today: NaiveDate) -> InsightsFilters {
    InsightsFilters {
        start_date: days_before(today, DEFAULT_RANGE_DAYS),
        end_date: today,
        role_id: None,
    }
}

/// Missing bounds fall back to the default range; `from` after `to` is an
/// error.
pub fn resolve_filters(
    today: NaiveDate,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    role_id: Option<i64>,
) -> AppResult<InsightsFilters> {
    let def = default_filters(today);
    let filters = InsightsFilters {
        start_date: from.unwrap_or(def.start_date),
        end_date: to.unwrap_or(def.end_date),
        role_id,
    };
    if filters.start_date > filters.end_date {
        return Err(AppError::Validation(format!(
            "Start date {} is after end date {}",
            filters.start_date, filters.end_date
        )));
    }
    Ok(filters)
}

/// Role hours cover every role; the role filter narrows tags and patterns.
pub fn fetch_report<A: ReportApi + ?Sized>(api: &A, filters: &InsightsFilters) -> AppResult<InsightsReport> {
    let all_roles = InsightsFilters {
        role_id: None,
        ..filters.clone()
    };
    Ok(InsightsReport {
        filters: filters.clone(),
        role_hours: api.role_hours(&all_roles)?,
        tags: api.tag_distribution(filters)?,
        patterns: api.patterns(filters)?,
    })
}

pub fn max_hours(rows: &[RoleHours]) -> f64 {
    rows.iter().map(|r| r.total_hours).fold(0.0, f64::max)
}

/// Bar length relative to the largest value.
pub fn bar_width(value: f64, max: f64, width: usize) -> usize {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    ((value / max) * width as f64).round() as usize
}

/// Percentage of sessions carrying a tag.
pub fn tag_share(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

/// Session starts per hour of day, missing hours as zero.
pub fn hour_grid(patterns: &Patterns) -> [u64; 24] {
    let mut grid = [0; 24];
    for h in &patterns.hour_distribution {
        if let Some(slot) = grid.get_mut(h.hour as usize) {
            *slot = h.count;
        }
    }
    grid
}

pub fn busiest_hour(patterns: &Patterns) -> Option<u32> {
    patterns
        .hour_distribution
        .iter()
        .filter(|h| h.count > 0)
        .max_by_key(|h| (h.count, std::cmp::Reverse(h.hour)))
        .map(|h| h.hour)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::insights::HourCount;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn default_range_is_last_seven_days() {
        let f = default_filters(d("2025-03-10"));
        assert_eq!(f.start_date, d("2025-03-03"));
        assert_eq!(f.end_date, d("2025-03-10"));
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(resolve_filters(d("2025-03-10"), Some(d("2025-03-11")), None, None).is_err());
        let f = resolve_filters(d("2025-03-10"), Some(d("2025-03-01")), None, Some(2)).unwrap();
        assert_eq!(f.start_date, d("2025-03-01"));
        assert_eq!(f.role_id, Some(2));
    }

    #[test]
    fn bars_and_shares() {
        assert_eq!(bar_width(5.0, 10.0, 30), 15);
        assert_eq!(bar_width(1.0, 0.0, 30), 0);
        assert_eq!(tag_share(1, 4), 25.0);
        assert_eq!(tag_share(3, 0), 0.0);
    }

    #[test]
    fn hour_grid_and_busiest_hour() {
        let p = Patterns {
            hour_distribution: vec![
                HourCount { hour: 9, count: 4 },
                HourCount { hour: 14, count: 4 },
                HourCount { hour: 30, count: 1 },
            ],
            day_distribution: vec![],
        };
        let grid = hour_grid(&p);
        assert_eq!(grid[9], 4);
        assert_eq!(grid.iter().sum::<u64>(), 8);
        assert_eq!(busiest_hour(&p), Some(9));
    }
}
