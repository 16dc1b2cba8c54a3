//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Validation event row.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::validation_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ValidationEventRecord {
    pub id: i32,
    pub event_id: String,
    pub severity: String,
    pub document_id: String,
    pub document_type: String,
    pub confidence: f64,
    /// JSON array of issue strings.
    pub issues: String,
    pub timestamp: String,
    pub user_id: String,
    pub user_role: String,
    pub action_url: Option<String>,
}

/// New validation event for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::validation_events)]
pub struct NewValidationEvent<'a> {
    pub event_id: &'a str,
    pub severity: &'a str,
    pub document_id: &'a str,
    pub document_type: &'a str,
    pub confidence: f64,
    pub issues: &'a str,
    pub timestamp: &'a str,
    pub user_id: &'a str,
    pub user_role: &'a str,
    pub action_url: Option<&'a str>,
}
