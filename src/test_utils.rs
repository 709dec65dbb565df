//! Shared test utilities for the mass tracker.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

pub use crate::clock::{Clock, FixedClock};
use crate::{
    core::{
        ledger::{self, MassCandidate},
        priest, series,
    },
    entities::{self, MassType, SeriesSource},
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Clock pinned to 15 March 2024.
#[must_use]
pub fn test_clock() -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap_or_default())
}

/// Creates a test priest with sensible defaults.
///
/// # Defaults
/// * `display_name`: "Fr. `username`"
/// * `province`: "Northern Province"
pub async fn create_test_priest(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::priest::Model> {
    priest::create_priest(db, username, &format!("Fr. {username}"), "Northern Province").await
}

/// Creates a bulk series starting on the test clock's date.
pub async fn create_test_series(
    db: &DatabaseConnection,
    priest_id: i64,
    source: SeriesSource,
    total_masses: i32,
) -> Result<entities::bulk_series::Model> {
    series::create_series(
        db,
        &test_clock(),
        priest_id,
        source,
        total_masses,
        "Test intention",
    )
    .await
}

/// Records a non-bulk mass on `date`.
///
/// # Defaults
/// * `intention_source`: "Test source"
/// * `intention_details`: "Test intention"
pub async fn record_test_mass(
    db: &DatabaseConnection,
    priest_id: i64,
    mass_type: MassType,
    date: NaiveDate,
) -> Result<entities::mass_event::Model> {
    let candidate =
        MassCandidate::new(priest_id, mass_type, "Test source", "Test intention").on(date);
    ledger::record_mass(db, &test_clock(), candidate).await
}

/// Sets up a complete test environment with one priest.
/// Returns (db, priest) for common test scenarios.
pub async fn setup_with_priest() -> Result<(DatabaseConnection, entities::priest::Model)> {
    let db = setup_test_db().await?;
    let priest = create_test_priest(&db, "father.john").await?;
    Ok((db, priest))
}
