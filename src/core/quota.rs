//! Monthly personal-mass quota.
//!
//! Quota status is derived from the ledger: the completed count for a month is the number
//! of personal masses the priest recorded with a date in that month. [`get_monthly_quota`]
//! recounts from scratch on every call and is the reference the [`QuotaCache`] is held to.

use crate::{
    core::priest,
    entities::{MassEvent, MassType, mass_event},
    errors::{Error, Result},
};
use chrono::{Datelike, Months, NaiveDate};
use sea_orm::{DatabaseConnection, prelude::*};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::trace;

const fn default_required_personal_masses() -> u32 {
    3
}

const fn default_series_low_threshold() -> i32 {
    3
}

/// Quota and advisory thresholds, read from the `[policy]` table of config.toml.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct QuotaPolicy {
    /// Personal masses each priest owes per month
    #[serde(default = "default_required_personal_masses")]
    pub required_personal_masses: u32,
    /// Active series with this many or fewer remaining masses trigger an advisory
    #[serde(default = "default_series_low_threshold")]
    pub series_low_threshold: i32,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            required_personal_masses: default_required_personal_masses(),
            series_low_threshold: default_series_low_threshold(),
        }
    }
}

/// Personal-mass tally of one priest for one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    /// Priest the tally belongs to
    pub priest_id: i64,
    /// Month (1-12)
    pub month: u32,
    /// Calendar year
    pub year: i32,
    /// Personal masses recorded in the month
    pub completed_count: u64,
    /// Personal masses owed per the policy
    pub required_count: u64,
}

impl QuotaStatus {
    /// Whether the quota for the month is met.
    #[must_use]
    pub const fn is_met(&self) -> bool {
        self.completed_count >= self.required_count
    }

    /// Personal masses still owed this month.
    #[must_use]
    pub const fn outstanding(&self) -> u64 {
        self.required_count.saturating_sub(self.completed_count)
    }
}

/// First and last day of a month.
///
/// Fails with [`Error::Validation`] when `month` is outside 1-12 or the year is out of
/// the supported calendar range.
pub fn month_bounds(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::validation(format!("Invalid month {month}/{year}")))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| Error::validation(format!("Invalid month {month}/{year}")))?;
    Ok((first, last))
}

/// Number of days in the month containing `date`.
#[must_use]
pub fn days_in_month(date: NaiveDate) -> u32 {
    month_bounds(date.month(), date.year()).map_or(31, |(_, last)| last.day())
}

/// Counts a priest's personal masses in a month, straight from the ledger.
pub async fn count_personal_masses<C>(
    db: &C,
    priest_id: i64,
    month: u32,
    year: i32,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    let (first, last) = month_bounds(month, year)?;

    MassEvent::find()
        .filter(mass_event::Column::PriestId.eq(priest_id))
        .filter(mass_event::Column::MassType.eq(MassType::Personal))
        .filter(mass_event::Column::Date.gte(first))
        .filter(mass_event::Column::Date.lte(last))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Computes a priest's quota status for a month from scratch.
///
/// Fails with [`Error::Validation`] for an invalid month and [`Error::NotFound`] for
/// an unknown priest. Performs no writes.
pub async fn get_monthly_quota<C>(
    db: &C,
    policy: &QuotaPolicy,
    priest_id: i64,
    month: u32,
    year: i32,
) -> Result<QuotaStatus>
where
    C: ConnectionTrait,
{
    month_bounds(month, year)?;
    priest::require_priest(db, priest_id).await?;

    let completed_count = count_personal_masses(db, priest_id, month, year).await?;

    Ok(QuotaStatus {
        priest_id,
        month,
        year,
        completed_count,
        required_count: u64::from(policy.required_personal_masses),
    })
}

/// Cache key: (priest, year, month)
pub type QuotaKey = (i64, i32, u32);

#[derive(Debug, Default)]
struct QuotaCacheState {
    counts: HashMap<QuotaKey, u64>,
    generation: u64,
}

/// Completed-count cache in front of [`count_personal_masses`].
///
/// Entries are dropped by [`QuotaCache::invalidate`] after every personal append. The
/// generation counter stops a reader whose recount started before an append from
/// storing its stale result after that append invalidated the key.
#[derive(Debug, Clone, Default)]
pub struct QuotaCache {
    state: Arc<RwLock<QuotaCacheState>>,
}

impl QuotaCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the completed count for a key, recounting from the ledger on a miss.
    pub async fn completed_count(
        &self,
        db: &DatabaseConnection,
        priest_id: i64,
        month: u32,
        year: i32,
    ) -> Result<u64> {
        let key = (priest_id, year, month);
        let generation = {
            let state = self.state.read().await;
            if let Some(count) = state.counts.get(&key) {
                trace!(?key, count, "Quota cache hit");
                return Ok(*count);
            }
            state.generation
        };

        let count = count_personal_masses(db, priest_id, month, year).await?;
        self.store(key, count, generation).await;
        Ok(count)
    }

    /// Caches `count` unless an invalidation happened since `generation` was read.
    async fn store(&self, key: QuotaKey, count: u64, generation: u64) {
        let mut state = self.state.write().await;
        if state.generation == generation {
            state.counts.insert(key, count);
        }
    }

    /// Drops the cached count for the month containing `date`.
    pub async fn invalidate(&self, priest_id: i64, date: NaiveDate) {
        let mut state = self.state.write().await;
        state.counts.remove(&(priest_id, date.year(), date.month()));
        state.generation += 1;
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.counts.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::ledger::{MassCandidate, record_mass};
    use crate::test_utils::*;

    #[test]
    fn test_month_bounds() {
        let (first, last) = month_bounds(2, 2024).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, last) = month_bounds(12, 2023).unwrap();
        assert_eq!(last, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        assert!(matches!(
            month_bounds(0, 2024),
            Err(Error::Validation { message: _ })
        ));
        assert!(matches!(
            month_bounds(13, 2024),
            Err(Error::Validation { message: _ })
        ));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2023, 2, 10).unwrap()), 28);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()), 30);
    }

    #[test]
    fn test_quota_status_helpers() {
        let status = QuotaStatus {
            priest_id: 1,
            month: 3,
            year: 2024,
            completed_count: 1,
            required_count: 3,
        };
        assert!(!status.is_met());
        assert_eq!(status.outstanding(), 2);

        let over = QuotaStatus {
            completed_count: 5,
            ..status
        };
        assert!(over.is_met());
        assert_eq!(over.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_quota_scenario() -> Result<()> {
        let (db, priest) = setup_with_priest().await?;
        let clock = test_clock();
        let policy = QuotaPolicy::default();
        let today = clock.today();

        for _ in 0..2 {
            let candidate =
                MassCandidate::new(priest.id, MassType::Personal, "Family", "For my parents");
            record_mass(&db, &clock, candidate).await?;
        }

        let status = get_monthly_quota(&db, &policy, priest.id, today.month(), today.year()).await?;
        assert_eq!(status.completed_count, 2);
        assert_eq!(status.required_count, 3);

        let candidate =
            MassCandidate::new(priest.id, MassType::Personal, "Family", "For my sister");
        record_mass(&db, &clock, candidate).await?;

        let status = get_monthly_quota(&db, &policy, priest.id, today.month(), today.year()).await?;
        assert_eq!(status.completed_count, 3);
        assert_eq!(status.required_count, 3);
        assert!(status.is_met());

        Ok(())
    }

    #[tokio::test]
    async fn test_quota_only_counts_personal_masses_in_month() -> Result<()> {
        let (db, priest) = setup_with_priest().await?;
        let other = create_test_priest(&db, "father.michael").await?;
        let policy = QuotaPolicy {
            required_personal_masses: 5,
            ..QuotaPolicy::default()
        };

        let mar_01 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mar_31 = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let feb_29 = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let apr_01 = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();

        record_test_mass(&db, priest.id, MassType::Personal, mar_01).await?;
        record_test_mass(&db, priest.id, MassType::Personal, mar_31).await?;
        record_test_mass(&db, priest.id, MassType::Personal, feb_29).await?;
        record_test_mass(&db, priest.id, MassType::Personal, apr_01).await?;
        record_test_mass(&db, priest.id, MassType::Deceased, mar_01).await?;
        record_test_mass(&db, other.id, MassType::Personal, mar_01).await?;

        let status = get_monthly_quota(&db, &policy, priest.id, 3, 2024).await?;
        assert_eq!(status.completed_count, 2);
        assert_eq!(status.required_count, 5);

        Ok(())
    }

    #[tokio::test]
    async fn test_quota_read_is_idempotent() -> Result<()> {
        let (db, priest) = setup_with_priest().await?;
        let policy = QuotaPolicy::default();
        let day = test_clock().today();
        record_test_mass(&db, priest.id, MassType::Personal, day).await?;

        let first = get_monthly_quota(&db, &policy, priest.id, day.month(), day.year()).await?;
        let second = get_monthly_quota(&db, &policy, priest.id, day.month(), day.year()).await?;
        assert_eq!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn test_quota_errors() -> Result<()> {
        let (db, priest) = setup_with_priest().await?;
        let policy = QuotaPolicy::default();

        let result = get_monthly_quota(&db, &policy, priest.id, 13, 2024).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let result = get_monthly_quota(&db, &policy, 404, 3, 2024).await;
        assert!(matches!(
            result,
            Err(Error::NotFound {
                entity: "Priest",
                id: _
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_cache_matches_recount() -> Result<()> {
        let (db, priest) = setup_with_priest().await?;
        let cache = QuotaCache::new();
        let day = test_clock().today();

        assert_eq!(cache.completed_count(&db, priest.id, day.month(), day.year()).await?, 0);
        assert_eq!(cache.len().await, 1);

        record_test_mass(&db, priest.id, MassType::Personal, day).await?;
        cache.invalidate(priest.id, day).await;
        assert!(cache.is_empty().await);

        let cached = cache.completed_count(&db, priest.id, day.month(), day.year()).await?;
        let recount = count_personal_masses(&db, priest.id, day.month(), day.year()).await?;
        assert_eq!(cached, 1);
        assert_eq!(cached, recount);

        Ok(())
    }

    #[tokio::test]
    async fn test_cache_ignores_results_started_before_invalidation() -> Result<()> {
        let (db, priest) = setup_with_priest().await?;
        let cache = QuotaCache::new();
        let day = test_clock().today();

        // A reader captured the generation, then an append invalidated the key
        let stale_generation = cache.state.read().await.generation;
        cache.invalidate(priest.id, day).await;
        cache
            .store((priest.id, day.year(), day.month()), 99, stale_generation)
            .await;
        assert!(cache.is_empty().await);

        assert_eq!(cache.completed_count(&db, priest.id, day.month(), day.year()).await?, 0);
        Ok(())
    }
}
