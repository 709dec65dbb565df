use dotenvy::dotenv;
use mass_tracker::{
    clock::SystemClock,
    config::{database, settings},
    core::{advisory::TracingSink, priest},
    errors::{Error, Result},
    service::MassService,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load config.toml, falling back to the default policy with no priests to seed
    let app_config = match settings::load_default_config() {
        Ok(config) => config,
        Err(Error::Config { message }) => {
            warn!("Using default configuration: {message}");
            settings::AppConfig::default()
        }
        Err(e) => return Err(e),
    };
    info!(
        required_personal_masses = app_config.policy.required_personal_masses,
        priests = app_config.priests.len(),
        "Configuration loaded."
    );

    // 4. Initialize database
    std::fs::create_dir_all("data")?;
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed the priest register
    priest::seed_priests(&db, &app_config.priests)
        .await
        .inspect_err(|e| error!("Failed to seed priests: {e}"))?;

    // 6. Report today's advisories for every priest
    let service = MassService::new(
        db,
        Arc::new(SystemClock),
        Arc::new(TracingSink),
        app_config.policy,
    );
    let sent = service.notify_all_priests().await?;
    info!("Mass tracker ready; {sent} advisories issued.");

    Ok(())
}
