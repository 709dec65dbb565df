/// Database configuration and connection management
pub mod database;

/// Quota policy and priest seeding from config.toml
pub mod settings;
