//! Priest entity - The identity that celebrates masses and owns bulk series.
//!
//! Priests are created once (usually seeded from config.toml) and never modified.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Priest database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "priests")]
pub struct Model {
    /// Unique identifier for the priest
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name, unique across the register (e.g. `"father.john"`)
    #[sea_orm(unique)]
    pub username: String,
    /// Name shown to people (e.g. "Fr. John Smith")
    pub display_name: String,
    /// Province the priest belongs to
    pub province: String,
}

/// Defines relationships between Priest and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One priest has many recorded masses
    #[sea_orm(has_many = "super::mass_event::Entity")]
    MassEvents,
    /// One priest is assigned many bulk series
    #[sea_orm(has_many = "super::bulk_series::Entity")]
    BulkSeries,
}

impl Related<super::mass_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MassEvents.def()
    }
}

impl Related<super::bulk_series::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BulkSeries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
