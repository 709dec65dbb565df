//! Core business logic - framework-agnostic ledger, series, quota and reporting operations.
//!
//! Functions take any `sea_orm::ConnectionTrait` so they run against a connection or
//! inside a caller's transaction.

/// Advisories and notification sinks
pub mod advisory;
/// Append-only mass ledger
pub mod ledger;
/// Priest registry
pub mod priest;
/// Monthly personal-mass quota and its cache
pub mod quota;
/// Derived reports
pub mod report;
/// Bulk series lifecycle
pub mod series;
