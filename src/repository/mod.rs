//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against SQLite.

pub mod diesel_models;
pub mod diesel_pool;
pub mod diesel_validation_events;
pub mod util;

pub use diesel_pool::{AsyncSqliteConnection, AsyncSqlitePool, DieselError};
pub use diesel_validation_events::DieselValidationEventRepository;
pub use util::{parse_datetime, to_diesel_error};
