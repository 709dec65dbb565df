//! Report generation business logic.
//!
//! This module derives summaries, recent-activity lists and series reports from the
//! ledger. Everything here is read-only and recomputed on each call; results are plain
//! structs for the caller to present.

use crate::{
    core::{
        ledger::{self, MassFilter},
        priest,
        quota::month_bounds,
        series::{self, SeriesProgress},
    },
    entities::{MassEvent, MassType, bulk_series, mass_event},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};
use sea_orm::{QueryOrder, QuerySelect, prelude::*};
use std::collections::BTreeMap;

/// Number of recent masses included when the caller does not specify a limit
pub const DEFAULT_RECENT_LIMIT: u64 = 10;

/// Mass counts for the current month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthSummary {
    /// Month (1-12)
    pub month: u32,
    /// Calendar year
    pub year: i32,
    /// All masses in the month
    pub total: u64,
    /// Personal masses in the month
    pub personal: u64,
    /// Province and generalate bulk masses together
    pub bulk: u64,
    /// Per-type counts in the month; types without masses are absent
    pub by_type: BTreeMap<MassType, u64>,
}

/// All-time and current-month mass counts of one priest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MassSummary {
    /// Priest the summary belongs to
    pub priest_id: i64,
    /// All masses ever recorded
    pub total: u64,
    /// Per-type counts over the whole ledger; types without masses are absent
    pub by_type: BTreeMap<MassType, u64>,
    /// Counts restricted to the month containing `today`
    pub current_month: MonthSummary,
}

/// A bulk series with its progress and latest masses.
#[derive(Debug, Clone)]
pub struct SeriesReport {
    /// The series being reported on
    pub series: bulk_series::Model,
    /// Celebrated/total and percentage
    pub progress: SeriesProgress,
    /// Most recent masses recorded against the series, newest first
    pub recent_masses: Vec<mass_event::Model>,
}

fn count_by_type<'a>(
    events: impl Iterator<Item = &'a mass_event::Model>,
) -> BTreeMap<MassType, u64> {
    events.fold(BTreeMap::new(), |mut counts, event| {
        *counts.entry(event.mass_type).or_insert(0) += 1;
        counts
    })
}

/// Summarises a priest's masses over the full ledger and the month containing `today`.
pub async fn get_summary<C>(db: &C, priest_id: i64, today: NaiveDate) -> Result<MassSummary>
where
    C: ConnectionTrait,
{
    priest::require_priest(db, priest_id).await?;

    let events = ledger::list_for(db, priest_id, &MassFilter::default()).await?;
    let (first, last) = month_bounds(today.month(), today.year())?;

    let by_type = count_by_type(events.iter());
    let month_by_type = count_by_type(
        events
            .iter()
            .filter(|event| event.date >= first && event.date <= last),
    );

    let month_total: u64 = month_by_type.values().sum();
    let personal = month_by_type.get(&MassType::Personal).copied().unwrap_or(0);
    let bulk: u64 = month_by_type
        .iter()
        .filter(|(mass_type, _)| mass_type.is_bulk())
        .map(|(_, count)| count)
        .sum();

    Ok(MassSummary {
        priest_id,
        total: by_type.values().sum(),
        by_type,
        current_month: MonthSummary {
            month: today.month(),
            year: today.year(),
            total: month_total,
            personal,
            bulk,
            by_type: month_by_type,
        },
    })
}

/// Returns a priest's `limit` most recent masses, newest date first; masses on the same
/// date come most-recently-recorded first.
pub async fn get_recent<C>(db: &C, priest_id: i64, limit: u64) -> Result<Vec<mass_event::Model>>
where
    C: ConnectionTrait,
{
    MassEvent::find()
        .filter(mass_event::Column::PriestId.eq(priest_id))
        .order_by_desc(mass_event::Column::Date)
        .order_by_desc(mass_event::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Builds a report for one series: progress plus its most recent masses.
///
/// `mass_limit` defaults to [`DEFAULT_RECENT_LIMIT`].
pub async fn generate_series_report<C>(
    db: &C,
    series_id: i64,
    mass_limit: Option<u64>,
) -> Result<SeriesReport>
where
    C: ConnectionTrait,
{
    let series = series::get_series_by_id(db, series_id)
        .await?
        .ok_or_else(|| Error::not_found("Bulk series", series_id))?;

    let limit = mass_limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let recent_masses = MassEvent::find()
        .filter(mass_event::Column::BulkSeriesId.eq(series_id))
        .order_by_desc(mass_event::Column::Date)
        .order_by_desc(mass_event::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    Ok(SeriesReport {
        progress: series::series_progress(&series),
        series,
        recent_masses,
    })
}
