//! Advisories - read-only nudges derived from the ledger and the series tracker.
//!
//! Two advisories exist: a priest falling behind the pro-rated personal-mass quota for
//! the current month, and an active bulk series close to exhaustion. They are computed
//! on demand, handed to a [`NotificationSink`] and never stored.

use crate::{
    core::{
        quota::{self, QuotaPolicy},
        series,
    },
    errors::Result,
};
use chrono::{Datelike, NaiveDate};
use sea_orm::ConnectionTrait;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// Something worth telling a priest about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// Fewer personal masses than expected by this point of the month
    QuotaBehind {
        /// Priest concerned
        priest_id: i64,
        /// Personal masses recorded so far this month
        completed: u64,
        /// Expected by today, pro-rated over the month
        expected: u64,
        /// Required for the whole month
        required: u64,
    },
    /// An active series has only a few masses left
    SeriesNearlyComplete {
        /// Priest concerned
        priest_id: i64,
        /// The series
        series_id: i64,
        /// Masses still to celebrate
        remaining: i32,
    },
}

/// Receives advisories. Delivery is best-effort and must not block the caller.
pub trait NotificationSink: Send + Sync {
    /// Deliver a single advisory.
    fn notify(&self, advisory: Advisory);

    /// Deliver several advisories.
    fn notify_all(&self, advisories: Vec<Advisory>) {
        for advisory in advisories {
            self.notify(advisory);
        }
    }
}

/// Writes advisories to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, advisory: Advisory) {
        match advisory {
            Advisory::QuotaBehind {
                priest_id,
                completed,
                expected,
                required,
            } => warn!(
                priest_id,
                completed, expected, required, "Personal mass quota is behind schedule"
            ),
            Advisory::SeriesNearlyComplete {
                priest_id,
                series_id,
                remaining,
            } => info!(priest_id, series_id, remaining, "Bulk series nearly complete"),
        }
    }
}

/// Discards advisories.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl NotificationSink for NoOpSink {
    fn notify(&self, _advisory: Advisory) {}
}

/// Collects advisories in memory so callers can inspect them.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    advisories: Arc<Mutex<Vec<Advisory>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything delivered so far.
    #[must_use]
    pub fn advisories(&self) -> Vec<Advisory> {
        self.advisories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forgets everything delivered so far.
    pub fn clear(&self) {
        self.advisories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, advisory: Advisory) {
        self.advisories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(advisory);
    }
}

/// Personal masses expected by `today`: the monthly requirement pro-rated by the share
/// of the month that has elapsed, rounded down.
#[must_use]
pub fn expected_by(today: NaiveDate, required: u64) -> u64 {
    required * u64::from(today.day()) / u64::from(quota::days_in_month(today))
}

/// Computes the advisories that apply to a priest on `today`.
pub async fn evaluate_advisories<C>(
    db: &C,
    policy: &QuotaPolicy,
    priest_id: i64,
    today: NaiveDate,
) -> Result<Vec<Advisory>>
where
    C: ConnectionTrait,
{
    let mut advisories = Vec::new();

    let status =
        quota::get_monthly_quota(db, policy, priest_id, today.month(), today.year()).await?;
    let expected = expected_by(today, status.required_count);
    if status.completed_count < expected {
        advisories.push(Advisory::QuotaBehind {
            priest_id,
            completed: status.completed_count,
            expected,
            required: status.required_count,
        });
    }

    for series in series::get_series_for_priest(db, priest_id, true).await? {
        if series.remaining_masses <= policy.series_low_threshold {
            advisories.push(Advisory::SeriesNearlyComplete {
                priest_id,
                series_id: series.id,
                remaining: series.remaining_masses,
            });
        }
    }

    Ok(advisories)
}
