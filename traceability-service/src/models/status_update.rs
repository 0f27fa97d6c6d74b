//! Status update models, shared by the ChangeStatus endpoint and the
//! operations-log queue consumer.

use chrono::NaiveDateTime;
use serde::Deserialize;

/// One status event for a single part. This is both the queue message
/// format and the unit of work applied per part inside a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub part_id: String,
    pub employee_id: Option<String>,
    pub station_id: Option<i32>,
    pub status: Option<String>,
    pub status_timestamp: Option<NaiveDateTime>,
    pub shipping_id: Option<String>,
}

/// ChangeStatus request: apply a status to every part travelling in the
/// given gitterbox, optionally narrowed to the workspace it currently sits
/// at.
#[derive(Debug, Clone, Deserialize)]
pub struct GitterStatusChange {
    pub station_id: Option<i32>,
    pub status: Option<String>,
    pub status_timestamp: Option<NaiveDateTime>,
    pub shipping_id: String,
    pub current_workspace_id: Option<i32>,
}
