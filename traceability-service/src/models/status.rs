//! Status lookup models.
//!
//! JSON key names are part of the wire contract with the status frontend
//! and must not change: `station_id` carries the station *name*, and
//! `zmena` marks rows that came from the history side of the join.

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

/// Label placed in `zmena` when a row originates from the history log.
pub const STATUS_CHANGE_LABEL: &str = "zmena statusu";

/// One row of a part's status history.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatusRecord {
    pub part_id: String,
    /// Station name resolved via the station lookup table.
    pub station_id: Option<String>,
    /// Reading mode recorded at the station visit.
    pub rezim_cteni: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub employee_id: Option<String>,
    /// Shipping container the part travelled in.
    pub gitterbox_id: Option<String>,
    /// Populated only when the row came from the history log.
    pub history_status: Option<String>,
    /// `"zmena statusu"` when `history_status` is set, null otherwise.
    pub zmena: Option<String>,
}

/// Successful InfoStatus response body.
#[derive(Debug, Clone, Serialize)]
pub struct PartHistory {
    pub part_history: Vec<StatusRecord>,
}

/// Row shape of the `part_status` table.
#[derive(Debug, Clone, FromRow)]
pub struct PartStatusRow {
    pub last_status: Option<String>,
    pub station_id: Option<i32>,
    pub status_timestamp: Option<NaiveDateTime>,
    pub create_timestamp: Option<NaiveDateTime>,
    pub employee_id: Option<String>,
    pub shipping_id: Option<String>,
}

/// Current status of a part, the ReadStatus response body.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentStatus {
    pub part_id: String,
    pub latest_status: Option<String>,
    /// Station id rendered as a string, matching what the frontend expects.
    pub latest_workspace_id: Option<String>,
    pub status_timestamp: Option<NaiveDateTime>,
    pub create_timestamp: Option<NaiveDateTime>,
    pub employee_id: Option<String>,
    pub shipping_id: Option<String>,
}

impl CurrentStatus {
    pub fn from_row(part_id: &str, row: PartStatusRow) -> Self {
        CurrentStatus {
            part_id: part_id.to_string(),
            latest_status: row.last_status,
            latest_workspace_id: row.station_id.map(|id| id.to_string()),
            status_timestamp: row.status_timestamp,
            create_timestamp: row.create_timestamp,
            employee_id: row.employee_id,
            shipping_id: row.shipping_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn status_record_serializes_under_contract_keys() {
        let record = StatusRecord {
            part_id: "ABC123".to_string(),
            station_id: Some("Kovaci linka".to_string()),
            rezim_cteni: Some("OK".to_string()),
            timestamp: Some(sample_timestamp()),
            employee_id: Some("E42".to_string()),
            gitterbox_id: Some("G-7".to_string()),
            history_status: Some("NOK".to_string()),
            zmena: Some(STATUS_CHANGE_LABEL.to_string()),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["part_id"], "ABC123");
        assert_eq!(json["station_id"], "Kovaci linka");
        assert_eq!(json["rezim_cteni"], "OK");
        assert_eq!(json["timestamp"], "2024-01-01T10:00:00");
        assert_eq!(json["gitterbox_id"], "G-7");
        assert_eq!(json["zmena"], "zmena statusu");
    }

    #[test]
    fn live_rows_serialize_null_history_fields() {
        let record = StatusRecord {
            part_id: "ABC123".to_string(),
            station_id: None,
            rezim_cteni: Some("OK".to_string()),
            timestamp: Some(sample_timestamp()),
            employee_id: None,
            gitterbox_id: None,
            history_status: None,
            zmena: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["station_id"].is_null());
        assert!(json["history_status"].is_null());
        assert!(json["zmena"].is_null());
    }

    #[test]
    fn current_status_renders_station_id_as_string() {
        let row = PartStatusRow {
            last_status: Some("OK".to_string()),
            station_id: Some(12),
            status_timestamp: Some(sample_timestamp()),
            create_timestamp: Some(sample_timestamp()),
            employee_id: Some("E42".to_string()),
            shipping_id: None,
        };

        let status = CurrentStatus::from_row("ABC123", row);
        assert_eq!(status.latest_workspace_id.as_deref(), Some("12"));

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["latest_workspace_id"], "12");
        assert!(json["shipping_id"].is_null());
    }
}
