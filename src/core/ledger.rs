//! Mass ledger business logic - recording and querying celebrated masses.
//!
//! The ledger is append-only: [`record_mass`] is the only way a row enters the
//! `mass_events` table and nothing updates or deletes rows afterwards. Recording a bulk
//! mass consumes one intention from its series inside the same database transaction,
//! so either both the decrement and the append are committed or neither is.

use crate::{
    clock::Clock,
    core::{priest, series},
    entities::{MassEvent, MassType, mass_event},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Select, Set, TransactionTrait, prelude::*};
use tracing::debug;

/// A mass as submitted by the caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MassCandidate {
    /// Celebrating priest
    pub priest_id: i64,
    /// Date of the celebration; `None` means today according to the clock
    pub date: Option<NaiveDate>,
    /// Kind of mass
    pub mass_type: MassType,
    /// Who requested the intention
    pub intention_source: String,
    /// Intention text; ignored for bulk masses, which take the series description
    pub intention_details: String,
    /// Series to consume, required for bulk masses and forbidden otherwise
    pub bulk_series_id: Option<i64>,
    /// Fixed-calendar obligation
    pub is_fixed_date: bool,
}

impl MassCandidate {
    /// A non-bulk mass dated today.
    pub fn new(
        priest_id: i64,
        mass_type: MassType,
        intention_source: impl Into<String>,
        intention_details: impl Into<String>,
    ) -> Self {
        Self {
            priest_id,
            date: None,
            mass_type,
            intention_source: intention_source.into(),
            intention_details: intention_details.into(),
            bulk_series_id: None,
            is_fixed_date: false,
        }
    }

    /// A bulk mass consuming one intention of `series_id`, dated today.
    pub fn bulk(
        priest_id: i64,
        mass_type: MassType,
        intention_source: impl Into<String>,
        series_id: i64,
    ) -> Self {
        Self {
            bulk_series_id: Some(series_id),
            ..Self::new(priest_id, mass_type, intention_source, String::new())
        }
    }

    /// Sets an explicit celebration date.
    #[must_use]
    pub const fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Marks the mass as a fixed-calendar obligation.
    #[must_use]
    pub const fn fixed_date(mut self) -> Self {
        self.is_fixed_date = true;
        self
    }
}

/// Ordering of [`list_for`] results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MassOrder {
    /// Insertion order
    #[default]
    Recorded,
    /// Ascending by celebration date, ties in insertion order
    Date,
}

/// Filters for ledger queries. Date bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MassFilter {
    /// Earliest date to include
    pub from: Option<NaiveDate>,
    /// Latest date to include
    pub to: Option<NaiveDate>,
    /// Only masses of this type
    pub mass_type: Option<MassType>,
    /// Result ordering
    pub order: MassOrder,
}

/// Checks the parts of a candidate that need no database access.
pub fn validate_candidate(candidate: &MassCandidate) -> Result<()> {
    if candidate.intention_source.trim().is_empty() {
        return Err(Error::validation("Intention source cannot be empty"));
    }

    match (candidate.mass_type.is_bulk(), candidate.bulk_series_id) {
        (true, None) => Err(Error::validation(format!(
            "A {:?} mass must reference a bulk series",
            candidate.mass_type
        ))),
        (false, Some(series_id)) => Err(Error::validation(format!(
            "A {:?} mass cannot reference bulk series {series_id}",
            candidate.mass_type
        ))),
        (false, None) if candidate.intention_details.trim().is_empty() => {
            Err(Error::validation("Intention details cannot be empty"))
        }
        _ => Ok(()),
    }
}

/// Validates a candidate and appends it to the ledger.
///
/// For bulk masses the referenced series is consumed first, in the same transaction:
/// the event's `serial_number` becomes the series' remaining count before the decrement
/// and its `intention_details` the series description, whatever the caller supplied.
/// Any failure (validation, unknown priest or series, exhausted series, store error)
/// rolls the whole operation back.
pub async fn record_mass<C>(
    db: &C,
    clock: &dyn Clock,
    candidate: MassCandidate,
) -> Result<mass_event::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    validate_candidate(&candidate)?;
    let date = candidate.date.unwrap_or_else(|| clock.today());

    let txn = db.begin().await?;

    priest::require_priest(&txn, candidate.priest_id).await?;

    let (intention_details, serial_number) = match candidate.bulk_series_id {
        Some(series_id) => {
            let consumption =
                series::consume_one_in(&txn, candidate.priest_id, series_id, date).await?;
            if candidate.mass_type.series_source() != Some(consumption.source) {
                // Dropping the transaction rolls the decrement back
                return Err(Error::validation(format!(
                    "A {:?} mass cannot consume a {:?} series",
                    candidate.mass_type, consumption.source
                )));
            }
            (
                consumption.intention_description,
                Some(consumption.serial_number),
            )
        }
        None => (candidate.intention_details.trim().to_string(), None),
    };

    let event = mass_event::ActiveModel {
        priest_id: Set(candidate.priest_id),
        date: Set(date),
        mass_type: Set(candidate.mass_type),
        intention_source: Set(candidate.intention_source.trim().to_string()),
        intention_details: Set(intention_details),
        bulk_series_id: Set(candidate.bulk_series_id),
        serial_number: Set(serial_number),
        is_fixed_date: Set(candidate.is_fixed_date),
        recorded_at: Set(clock.now()),
        ..Default::default()
    };

    let event = event.insert(&txn).await?;
    txn.commit().await?;

    debug!(
        mass_id = event.id,
        priest_id = event.priest_id,
        mass_type = ?event.mass_type,
        serial_number = ?event.serial_number,
        "Recorded mass"
    );
    Ok(event)
}

/// Retrieves a single mass by ID.
pub async fn get_mass_by_id<C>(db: &C, mass_id: i64) -> Result<Option<mass_event::Model>>
where
    C: ConnectionTrait,
{
    MassEvent::find_by_id(mass_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Builds the query for a priest's masses without running it.
#[must_use]
pub fn mass_query(priest_id: i64, filter: &MassFilter) -> Select<MassEvent> {
    let mut query = MassEvent::find().filter(mass_event::Column::PriestId.eq(priest_id));

    if let Some(from) = filter.from {
        query = query.filter(mass_event::Column::Date.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(mass_event::Column::Date.lte(to));
    }
    if let Some(mass_type) = filter.mass_type {
        query = query.filter(mass_event::Column::MassType.eq(mass_type));
    }

    match filter.order {
        MassOrder::Recorded => query.order_by_asc(mass_event::Column::Id),
        MassOrder::Date => query
            .order_by_asc(mass_event::Column::Date)
            .order_by_asc(mass_event::Column::Id),
    }
}

/// Lists a priest's masses matching `filter`.
pub async fn list_for<C>(
    db: &C,
    priest_id: i64,
    filter: &MassFilter,
) -> Result<Vec<mass_event::Model>>
where
    C: ConnectionTrait,
{
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(Error::validation(format!(
                "Date range is inverted: {from} is after {to}"
            )));
        }
    }

    mass_query(priest_id, filter)
        .all(db)
        .await
        .map_err(Into::into)
}
