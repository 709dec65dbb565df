//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod bulk_series;
pub mod mass_event;
pub mod priest;

// Re-export specific types to avoid conflicts
pub use bulk_series::{
    Column as BulkSeriesColumn, Entity as BulkSeries, Model as BulkSeriesModel, SeriesSource,
};
pub use mass_event::{
    Column as MassEventColumn, Entity as MassEvent, MassType, Model as MassEventModel,
};
pub use priest::{Column as PriestColumn, Entity as Priest, Model as PriestModel};
