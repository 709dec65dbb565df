//! Service context - the shared state every caller needs, bundled once.
//!
//! [`MassService`] owns the database connection together with the clock, the
//! notification sink, the quota policy and the quota cache. Its methods delegate to the
//! `core` functions and add the cross-cutting behaviour: default dates from the clock,
//! cache invalidation after personal appends and advisories after each record.

use crate::{
    clock::Clock,
    core::{
        advisory::{self, Advisory, NotificationSink},
        ledger::{self, MassCandidate, MassFilter},
        priest,
        quota::{QuotaCache, QuotaPolicy, QuotaStatus, month_bounds},
        report::{self, MassSummary},
        series,
    },
    entities::{MassType, SeriesSource, bulk_series, mass_event},
    errors::Result,
};
use chrono::Datelike;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::warn;

/// Shared context for recording masses and reading derived views.
#[derive(Clone)]
pub struct MassService {
    database: DatabaseConnection,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
    policy: QuotaPolicy,
    quota_cache: QuotaCache,
}

impl MassService {
    /// Creates a new service over an initialised database.
    pub fn new(
        database: DatabaseConnection,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
        policy: QuotaPolicy,
    ) -> Self {
        Self {
            database,
            clock,
            sink,
            policy,
            quota_cache: QuotaCache::new(),
        }
    }

    /// The underlying connection.
    #[must_use]
    pub const fn database(&self) -> &DatabaseConnection {
        &self.database
    }

    /// The active quota policy.
    #[must_use]
    pub const fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Creates a bulk series starting today.
    pub async fn create_series(
        &self,
        priest_id: i64,
        source: SeriesSource,
        total_masses: i32,
        intention_description: &str,
    ) -> Result<bulk_series::Model> {
        series::create_series(
            &self.database,
            self.clock.as_ref(),
            priest_id,
            source,
            total_masses,
            intention_description,
        )
        .await
    }

    /// Records a mass, then refreshes derived state and sends advisories.
    ///
    /// Advisory evaluation happens after the commit; a failure there is logged and
    /// does not affect the returned event.
    pub async fn record_mass(&self, candidate: MassCandidate) -> Result<mass_event::Model> {
        let event = ledger::record_mass(&self.database, self.clock.as_ref(), candidate).await?;

        if event.mass_type == MassType::Personal {
            self.quota_cache.invalidate(event.priest_id, event.date).await;
        }

        match self.advisories_for(event.priest_id).await {
            Ok(advisories) => self.sink.notify_all(advisories),
            Err(e) => warn!(
                priest_id = event.priest_id,
                "Failed to evaluate advisories: {e}"
            ),
        }

        Ok(event)
    }

    /// Quota status for a month, served from the cache when possible.
    pub async fn monthly_quota(
        &self,
        priest_id: i64,
        month: u32,
        year: i32,
    ) -> Result<QuotaStatus> {
        month_bounds(month, year)?;
        priest::require_priest(&self.database, priest_id).await?;

        let completed_count = self
            .quota_cache
            .completed_count(&self.database, priest_id, month, year)
            .await?;

        Ok(QuotaStatus {
            priest_id,
            month,
            year,
            completed_count,
            required_count: u64::from(self.policy.required_personal_masses),
        })
    }

    /// Quota status for the current month.
    pub async fn current_quota(&self, priest_id: i64) -> Result<QuotaStatus> {
        let today = self.clock.today();
        self.monthly_quota(priest_id, today.month(), today.year()).await
    }

    /// All-time and current-month summary.
    pub async fn summary(&self, priest_id: i64) -> Result<MassSummary> {
        report::get_summary(&self.database, priest_id, self.clock.today()).await
    }

    /// Most recent masses of a priest.
    pub async fn recent(&self, priest_id: i64, limit: u64) -> Result<Vec<mass_event::Model>> {
        report::get_recent(&self.database, priest_id, limit).await
    }

    /// Masses of a priest matching `filter`.
    pub async fn masses(
        &self,
        priest_id: i64,
        filter: &MassFilter,
    ) -> Result<Vec<mass_event::Model>> {
        ledger::list_for(&self.database, priest_id, filter).await
    }

    /// Series assigned to a priest.
    pub async fn series_for(
        &self,
        priest_id: i64,
        active_only: bool,
    ) -> Result<Vec<bulk_series::Model>> {
        series::get_series_for_priest(&self.database, priest_id, active_only).await
    }

    /// Advisories that apply to a priest today.
    pub async fn advisories_for(&self, priest_id: i64) -> Result<Vec<Advisory>> {
        advisory::evaluate_advisories(&self.database, &self.policy, priest_id, self.clock.today())
            .await
    }

    /// Evaluates advisories for every registered priest and sends them to the sink.
    ///
    /// Returns how many advisories were sent.
    pub async fn notify_all_priests(&self) -> Result<usize> {
        let mut sent = 0;
        for priest in priest::get_all_priests(&self.database).await? {
            let advisories = self.advisories_for(priest.id).await?;
            sent += advisories.len();
            self.sink.notify_all(advisories);
        }
        Ok(sent)
    }
}
