//! Bulk series entity - A batch of mass intentions assigned to one priest.
//!
//! A series starts with `remaining_masses == total_masses` and is decremented once per
//! celebrated mass. When the counter reaches zero the series is deactivated for good.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Office that requested the batch of intentions
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum SeriesSource {
    /// Intentions sent by the province
    #[sea_orm(string_value = "province")]
    Province,
    /// Intentions sent by the generalate
    #[sea_orm(string_value = "generalate")]
    Generalate,
}

/// Bulk series database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bulk_series")]
pub struct Model {
    /// Unique identifier for the series
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Requesting office
    pub source: SeriesSource,
    /// Number of masses in the batch, fixed at creation (1-1000)
    pub total_masses: i32,
    /// Masses still to be celebrated
    pub remaining_masses: i32,
    /// Shared intention text, copied into every mass recorded against the series
    pub intention_description: String,
    /// Priest responsible for celebrating the batch
    pub assigned_priest_id: i64,
    /// Date the series was created
    pub start_date: Date,
    /// Date of the most recent mass recorded against the series
    pub last_celebrated_date: Option<Date>,
    /// False once the series is exhausted; never flips back
    pub is_active: bool,
}

/// Defines relationships between `BulkSeries` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each series is assigned to one priest
    #[sea_orm(
        belongs_to = "super::priest::Entity",
        from = "Column::AssignedPriestId",
        to = "super::priest::Column::Id"
    )]
    Priest,
    /// One series has many recorded masses
    #[sea_orm(has_many = "super::mass_event::Entity")]
    MassEvents,
}

impl Related<super::priest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Priest.def()
    }
}

impl Related<super::mass_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MassEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
