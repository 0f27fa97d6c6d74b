//! Forging-line (kovaci linka) scan models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use sqlx::FromRow;

/// Scan position on the line. Only the two ends are valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    A,
    B,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Position::A => "A",
            Position::B => "B",
        }
    }
}

impl std::str::FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Position::A),
            "B" => Ok(Position::B),
            _ => Err("Position must be either 'A' or 'B'".to_string()),
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw scan request body. All fields optional so validation can report
/// exactly which ones are missing.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanRequest {
    pub gitter_id: Option<String>,
    pub employee_id: Option<String>,
    pub position: Option<String>,
}

/// A validated scan, ready to persist.
#[derive(Debug, Clone)]
pub struct LineScan {
    pub gitter_id: String,
    pub employee_id: String,
    pub position: Position,
}

impl LineScan {
    pub fn try_from_request(req: ScanRequest) -> Result<Self, AppError> {
        let mut missing = Vec::new();
        if req.gitter_id.as_deref().map_or(true, str::is_empty) {
            missing.push("gitter_id");
        }
        if req.employee_id.as_deref().map_or(true, str::is_empty) {
            missing.push("employee_id");
        }
        if req.position.as_deref().map_or(true, str::is_empty) {
            missing.push("position");
        }
        if !missing.is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let position = req
            .position
            .as_deref()
            .unwrap_or_default()
            .parse::<Position>()
            .map_err(|msg| AppError::BadRequest(anyhow::anyhow!(msg)))?;

        Ok(LineScan {
            gitter_id: req.gitter_id.unwrap_or_default(),
            employee_id: req.employee_id.unwrap_or_default(),
            position,
        })
    }
}

/// Row shape of the `kovaci_linka_scans` table.
#[derive(Debug, Clone, FromRow)]
pub struct ScanRow {
    pub gitter_id: String,
    pub employee_id: String,
    pub timestamp: Option<NaiveDateTime>,
    pub position: String,
}

/// Positive KovaciLinkaCheck response body.
#[derive(Debug, Clone, Serialize)]
pub struct GitterCheck {
    pub exists: bool,
    pub gitter_id: String,
    pub employee_id: String,
    pub timestamp: Option<NaiveDateTime>,
    pub position: String,
}

impl From<ScanRow> for GitterCheck {
    fn from(row: ScanRow) -> Self {
        GitterCheck {
            exists: true,
            gitter_id: row.gitter_id,
            employee_id: row.employee_id,
            timestamp: row.timestamp,
            position: row.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_scan_request_passes_validation() {
        let scan = LineScan::try_from_request(ScanRequest {
            gitter_id: Some("G-7".to_string()),
            employee_id: Some("E42".to_string()),
            position: Some("A".to_string()),
        })
        .expect("Scan should validate");

        assert_eq!(scan.gitter_id, "G-7");
        assert_eq!(scan.position, Position::A);
    }

    #[test]
    fn missing_fields_are_listed_in_the_error() {
        let err = LineScan::try_from_request(ScanRequest {
            gitter_id: None,
            employee_id: Some("E42".to_string()),
            position: Some("".to_string()),
        })
        .expect_err("Validation should fail");

        let message = err.to_string();
        assert!(message.contains("gitter_id"));
        assert!(message.contains("position"));
        assert!(!message.contains("employee_id"));
    }

    #[test]
    fn position_must_be_a_or_b() {
        let err = LineScan::try_from_request(ScanRequest {
            gitter_id: Some("G-7".to_string()),
            employee_id: Some("E42".to_string()),
            position: Some("C".to_string()),
        })
        .expect_err("Position C must be rejected");

        assert!(err.to_string().contains("either 'A' or 'B'"));
    }
}
