//! Bulk series business logic - creation, consumption and progress of intention batches.
//!
//! A series is consumed one mass at a time. The decrement is a single conditional
//! `UPDATE` (`remaining_masses = remaining_masses - 1 WHERE is_active AND
//! remaining_masses > 0`), so concurrent writers can never consume the same unit twice
//! and a completed series can never be reactivated. [`consume_one`] runs in its own
//! database transaction; `core::ledger::record_mass` uses [`consume_one_in`] inside the
//! transaction that also appends the mass event.

use crate::{
    clock::Clock,
    entities::{BulkSeries, SeriesSource, bulk_series},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, info};

/// Smallest batch a province or generalate may request
pub const MIN_SERIES_MASSES: i32 = 1;
/// Largest batch a province or generalate may request
pub const MAX_SERIES_MASSES: i32 = 1000;

/// Outcome of consuming one intention from a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumption {
    /// The consumed series
    pub series_id: i64,
    /// Requesting office of the series
    pub source: SeriesSource,
    /// Remaining count just before the decrement; recorded as the mass serial number
    pub serial_number: i32,
    /// Remaining count after the decrement
    pub remaining_masses: i32,
    /// The series' shared intention text
    pub intention_description: String,
    /// Whether this consumption exhausted the series
    pub completed: bool,
}

/// How far a series has progressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesProgress {
    /// Masses already celebrated (`total - remaining`)
    pub celebrated: i32,
    /// Size of the batch
    pub total: i32,
    /// Completion as a percentage (0-100)
    pub percent: f64,
}

/// Creates a new active series assigned to `priest_id`.
///
/// `total_masses` must lie in [`MIN_SERIES_MASSES`]..=[`MAX_SERIES_MASSES`] and the
/// description must be non-empty after trimming; the trimmed text is stored. The start
/// date comes from `clock`.
pub async fn create_series<C>(
    db: &C,
    clock: &dyn Clock,
    priest_id: i64,
    source: SeriesSource,
    total_masses: i32,
    intention_description: &str,
) -> Result<bulk_series::Model>
where
    C: ConnectionTrait,
{
    if !(MIN_SERIES_MASSES..=MAX_SERIES_MASSES).contains(&total_masses) {
        return Err(Error::validation(format!(
            "Total masses must be between {MIN_SERIES_MASSES} and {MAX_SERIES_MASSES}, \
             got {total_masses}"
        )));
    }

    let description = intention_description.trim();
    if description.is_empty() {
        return Err(Error::validation("Intention description cannot be empty"));
    }

    crate::core::priest::require_priest(db, priest_id).await?;

    let series = bulk_series::ActiveModel {
        source: Set(source),
        total_masses: Set(total_masses),
        remaining_masses: Set(total_masses),
        intention_description: Set(description.to_string()),
        assigned_priest_id: Set(priest_id),
        start_date: Set(clock.today()),
        last_celebrated_date: Set(None),
        is_active: Set(true),
        ..Default::default()
    };

    let created = series.insert(db).await?;
    info!(
        series_id = created.id,
        priest_id,
        total_masses,
        "Created {source:?} bulk series"
    );
    Ok(created)
}

/// Finds a series by ID, returning None if absent.
pub async fn get_series_by_id<C>(db: &C, series_id: i64) -> Result<Option<bulk_series::Model>>
where
    C: ConnectionTrait,
{
    BulkSeries::find_by_id(series_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a series by ID, failing with [`Error::NotFound`] if absent.
pub async fn require_series<C>(db: &C, series_id: i64) -> Result<bulk_series::Model>
where
    C: ConnectionTrait,
{
    get_series_by_id(db, series_id)
        .await?
        .ok_or_else(|| Error::not_found("Bulk series", series_id))
}

/// Lists the series assigned to a priest in creation order, optionally only the active ones.
pub async fn get_series_for_priest<C>(
    db: &C,
    priest_id: i64,
    active_only: bool,
) -> Result<Vec<bulk_series::Model>>
where
    C: ConnectionTrait,
{
    let mut query = BulkSeries::find().filter(bulk_series::Column::AssignedPriestId.eq(priest_id));
    if active_only {
        query = query.filter(bulk_series::Column::IsActive.eq(true));
    }

    query
        .order_by_asc(bulk_series::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Consumes one intention from a series in its own transaction.
///
/// Fails with [`Error::NotFound`] for an unknown series, [`Error::Validation`] when the
/// series belongs to another priest and [`Error::InactiveSeries`] once it is exhausted.
pub async fn consume_one<C>(
    db: &C,
    priest_id: i64,
    series_id: i64,
    on_date: NaiveDate,
) -> Result<Consumption>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let consumption = consume_one_in(&txn, priest_id, series_id, on_date).await?;
    txn.commit().await?;
    Ok(consumption)
}

/// Consumes one intention using the caller's connection or open transaction.
///
/// The caller owns the transaction boundary. Only this function decrements
/// `remaining_masses`.
pub async fn consume_one_in<C>(
    db: &C,
    priest_id: i64,
    series_id: i64,
    on_date: NaiveDate,
) -> Result<Consumption>
where
    C: ConnectionTrait,
{
    // Every SET expression sees the pre-update row, so `is_active` becomes
    // `old_remaining > 1`, i.e. false exactly when this decrement reaches zero.
    let result = BulkSeries::update_many()
        .col_expr(
            bulk_series::Column::RemainingMasses,
            Expr::col(bulk_series::Column::RemainingMasses).sub(1),
        )
        .col_expr(
            bulk_series::Column::IsActive,
            Expr::col(bulk_series::Column::RemainingMasses).gt(1),
        )
        .col_expr(
            bulk_series::Column::LastCelebratedDate,
            Expr::value(on_date),
        )
        .filter(bulk_series::Column::Id.eq(series_id))
        .filter(bulk_series::Column::AssignedPriestId.eq(priest_id))
        .filter(bulk_series::Column::IsActive.eq(true))
        .filter(bulk_series::Column::RemainingMasses.gt(0))
        .exec(db)
        .await?;

    let series = require_series(db, series_id).await?;

    if result.rows_affected == 0 {
        if series.assigned_priest_id != priest_id {
            return Err(Error::validation(format!(
                "Bulk series {series_id} is not assigned to priest {priest_id}"
            )));
        }
        return Err(Error::InactiveSeries { series_id });
    }

    let completed = series.remaining_masses == 0;
    debug!(
        series_id,
        remaining = series.remaining_masses,
        "Consumed one intention"
    );
    if completed {
        info!(series_id, priest_id, "Bulk series completed");
    }

    Ok(Consumption {
        series_id,
        source: series.source,
        serial_number: series.remaining_masses + 1,
        remaining_masses: series.remaining_masses,
        intention_description: series.intention_description,
        completed,
    })
}

/// Calculates how far a series has progressed.
#[must_use]
pub fn series_progress(series: &bulk_series::Model) -> SeriesProgress {
    let celebrated = series.total_masses - series.remaining_masses;
    let percent = if series.total_masses == 0 {
        0.0
    } else {
        f64::from(celebrated) / f64::from(series.total_masses) * 100.0
    };

    SeriesProgress {
        celebrated,
        total: series.total_masses,
        percent,
    }
}
