//! Mass event entity - One celebrated mass in the append-only ledger.
//!
//! Rows are inserted once by `core::ledger::record_mass` and never updated or deleted.
//! The auto-incremented `id` doubles as the insertion order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::bulk_series::SeriesSource;

/// Kind of mass being recorded
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
pub enum MassType {
    /// Counts towards the monthly personal quota
    #[sea_orm(string_value = "personal")]
    Personal,
    /// Offered for the deceased
    #[sea_orm(string_value = "deceased")]
    Deceased,
    /// Consumes one intention of a province series
    #[sea_orm(string_value = "bulk_province")]
    BulkProvince,
    /// Consumes one intention of a generalate series
    #[sea_orm(string_value = "bulk_generalate")]
    BulkGeneralate,
    /// Any other special intention
    #[sea_orm(string_value = "special")]
    Special,
}

impl MassType {
    /// Whether this type consumes a bulk series.
    #[must_use]
    pub const fn is_bulk(self) -> bool {
        matches!(self, Self::BulkProvince | Self::BulkGeneralate)
    }

    /// The series source a bulk type draws from, `None` for the other types.
    #[must_use]
    pub const fn series_source(self) -> Option<SeriesSource> {
        match self {
            Self::BulkProvince => Some(SeriesSource::Province),
            Self::BulkGeneralate => Some(SeriesSource::Generalate),
            Self::Personal | Self::Deceased | Self::Special => None,
        }
    }
}

/// Mass event database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mass_events")]
pub struct Model {
    /// Unique identifier, increasing with insertion order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Priest who celebrated the mass
    pub priest_id: i64,
    /// Calendar date of the celebration
    pub date: Date,
    /// Kind of mass
    pub mass_type: MassType,
    /// Who requested the intention
    pub intention_source: String,
    /// Intention text; for bulk masses this is the series description
    pub intention_details: String,
    /// Series consumed by this mass, present iff `mass_type` is a bulk variant
    pub bulk_series_id: Option<i64>,
    /// Remaining count of the series just before this mass was recorded
    pub serial_number: Option<i32>,
    /// Whether the mass fulfils a fixed-calendar obligation
    pub is_fixed_date: bool,
    /// When the row was appended
    pub recorded_at: DateTimeUtc,
}

/// Defines relationships between `MassEvent` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each mass belongs to one priest
    #[sea_orm(
        belongs_to = "super::priest::Entity",
        from = "Column::PriestId",
        to = "super::priest::Column::Id"
    )]
    Priest,
    /// Bulk masses reference the series they consumed
    #[sea_orm(
        belongs_to = "super::bulk_series::Entity",
        from = "Column::BulkSeriesId",
        to = "super::bulk_series::Column::Id"
    )]
    BulkSeries,
}

impl Related<super::priest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Priest.def()
    }
}

impl Related<super::bulk_series::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BulkSeries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_types_map_to_sources() {
        assert!(MassType::BulkProvince.is_bulk());
        assert!(MassType::BulkGeneralate.is_bulk());
        assert!(!MassType::Personal.is_bulk());
        assert!(!MassType::Deceased.is_bulk());
        assert!(!MassType::Special.is_bulk());

        assert_eq!(
            MassType::BulkProvince.series_source(),
            Some(SeriesSource::Province)
        );
        assert_eq!(
            MassType::BulkGeneralate.series_source(),
            Some(SeriesSource::Generalate)
        );
        assert_eq!(MassType::Special.series_source(), None);
    }
}
