//! Priest registry - creation, lookup and seeding of priests.
//!
//! Priests are immutable once created. The register seeds them from config.toml
//! on startup; seeding skips usernames that already exist so it can run every time.

use crate::{
    config::settings::PriestConfig,
    entities::{Priest, priest},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Creates a new priest after validating and trimming every field.
///
/// Fails with [`Error::Validation`] if a field is blank or the username is taken.
pub async fn create_priest<C>(
    db: &C,
    username: &str,
    display_name: &str,
    province: &str,
) -> Result<priest::Model>
where
    C: ConnectionTrait,
{
    let username = username.trim();
    let display_name = display_name.trim();
    let province = province.trim();

    if username.is_empty() {
        return Err(Error::validation("Username cannot be empty"));
    }
    if display_name.is_empty() {
        return Err(Error::validation("Display name cannot be empty"));
    }
    if province.is_empty() {
        return Err(Error::validation("Province cannot be empty"));
    }

    if get_priest_by_username(db, username).await?.is_some() {
        return Err(Error::validation(format!(
            "Username '{username}' is already registered"
        )));
    }

    let priest = priest::ActiveModel {
        username: Set(username.to_string()),
        display_name: Set(display_name.to_string()),
        province: Set(province.to_string()),
        ..Default::default()
    };

    Ok(priest.insert(db).await?)
}

/// Finds a priest by ID, returning None if absent.
pub async fn get_priest_by_id<C>(db: &C, priest_id: i64) -> Result<Option<priest::Model>>
where
    C: ConnectionTrait,
{
    Priest::find_by_id(priest_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a priest by ID, failing with [`Error::NotFound`] if absent.
pub async fn require_priest<C>(db: &C, priest_id: i64) -> Result<priest::Model>
where
    C: ConnectionTrait,
{
    get_priest_by_id(db, priest_id)
        .await?
        .ok_or_else(|| Error::not_found("Priest", priest_id))
}

/// Finds a priest by username.
pub async fn get_priest_by_username<C>(db: &C, username: &str) -> Result<Option<priest::Model>>
where
    C: ConnectionTrait,
{
    Priest::find()
        .filter(priest::Column::Username.eq(username.trim()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists every priest in registration order.
pub async fn get_all_priests<C>(db: &C) -> Result<Vec<priest::Model>>
where
    C: ConnectionTrait,
{
    Priest::find()
        .order_by_asc(priest::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Inserts the configured priests that are not registered yet.
///
/// Returns how many priests were inserted.
pub async fn seed_priests<C>(db: &C, priests: &[PriestConfig]) -> Result<usize>
where
    C: ConnectionTrait,
{
    let mut inserted = 0;
    for config in priests {
        if get_priest_by_username(db, &config.username).await?.is_some() {
            continue;
        }
        create_priest(db, &config.username, &config.display_name, &config.province).await?;
        inserted += 1;
    }

    info!("Seeded {inserted} of {} configured priests", priests.len());
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_priest_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_priest(&db, "  ", "Fr. John Smith", "Northern Province").await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let result = create_priest(&db, "father.john", "", "Northern Province").await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let result = create_priest(&db, "father.john", "Fr. John Smith", "\t").await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        assert!(get_all_priests(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_priest_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let priest =
            create_priest(&db, " father.john ", "Fr. John Smith", "Northern Province").await?;
        assert_eq!(priest.username, "father.john");
        assert_eq!(priest.display_name, "Fr. John Smith");
        assert_eq!(priest.province, "Northern Province");

        let found = get_priest_by_id(&db, priest.id).await?;
        assert_eq!(found, Some(priest.clone()));

        let by_name = get_priest_by_username(&db, "father.john").await?;
        assert_eq!(by_name, Some(priest));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_priest_duplicate_username() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_priest(&db, "father.john").await?;

        let result = create_priest(&db, "father.john", "Someone Else", "Southern Province").await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        Ok(())
    }

    #[tokio::test]
    async fn test_require_priest_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = require_priest(&db, 999).await;
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
    async fn test_seed_priests_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let configs = vec![
            PriestConfig {
                username: "father.john".to_string(),
                display_name: "Fr. John Smith".to_string(),
                province: "Northern Province".to_string(),
            },
            PriestConfig {
                username: "father.michael".to_string(),
                display_name: "Fr. Michael Brown".to_string(),
                province: "Southern Province".to_string(),
            },
        ];

        assert_eq!(seed_priests(&db, &configs).await?, 2);
        assert_eq!(seed_priests(&db, &configs).await?, 0);

        let all = get_all_priests(&db).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].username, "father.john");
        assert_eq!(all[1].username, "father.michael");

        Ok(())
    }
}
