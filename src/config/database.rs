//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{BulkSeries, MassEvent, Priest};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/mass_tracker.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back to
/// a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the priest, bulk series and mass event tables if they do not exist yet.
///
/// Tables are created parent-first so the foreign keys generated from the entity
/// relations always point at an existing table.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut priest_table = schema.create_table_from_entity(Priest);
    priest_table.if_not_exists();
    let mut series_table = schema.create_table_from_entity(BulkSeries);
    series_table.if_not_exists();
    let mut mass_table = schema.create_table_from_entity(MassEvent);
    mass_table.if_not_exists();

    db.execute(builder.build(&priest_table)).await?;
    db.execute(builder.build(&series_table)).await?;
    db.execute(builder.build(&mass_table)).await?;

    info!("Database tables ensured (priests, bulk_series, mass_events)");
    Ok(())
}
