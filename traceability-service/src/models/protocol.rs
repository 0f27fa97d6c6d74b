//! Protocol part registration models.

use chrono::NaiveDateTime;
use serde::Deserialize;
use service_core::error::AppError;

/// Raw ProtocolPartInsert request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolPartRequest {
    pub part_id: Option<String>,
    pub protocol_id: Option<String>,
    pub employee_id: Option<String>,
    pub station_id: Option<i32>,
    pub status: Option<String>,
    pub status_timestamp: Option<NaiveDateTime>,
    pub shipping_id: Option<String>,
}

/// A validated protocol part registration.
#[derive(Debug, Clone)]
pub struct ProtocolPart {
    pub part_id: String,
    pub protocol_id: String,
    pub employee_id: Option<String>,
    pub station_id: Option<i32>,
    pub status: Option<String>,
    pub status_timestamp: Option<NaiveDateTime>,
    pub shipping_id: Option<String>,
}

impl ProtocolPart {
    /// Both identifiers are mandatory; everything else rides along.
    pub fn try_from_request(req: ProtocolPartRequest) -> Result<Self, AppError> {
        let part_id = req.part_id.filter(|v| !v.is_empty());
        let protocol_id = req.protocol_id.filter(|v| !v.is_empty());

        match (part_id, protocol_id) {
            (Some(part_id), Some(protocol_id)) => Ok(ProtocolPart {
                part_id,
                protocol_id,
                employee_id: req.employee_id,
                station_id: req.station_id,
                status: req.status,
                status_timestamp: req.status_timestamp,
                shipping_id: req.shipping_id,
            }),
            _ => Err(AppError::BadRequest(anyhow::anyhow!(
                "Request body must contain 'part_id' and 'protocol_id'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_requires_both_identifiers() {
        let err = ProtocolPart::try_from_request(ProtocolPartRequest {
            part_id: Some("ABC123".to_string()),
            protocol_id: None,
            employee_id: None,
            station_id: None,
            status: None,
            status_timestamp: None,
            shipping_id: None,
        })
        .expect_err("Missing protocol_id must be rejected");

        assert!(err.to_string().contains("'part_id' and 'protocol_id'"));
    }

    #[test]
    fn empty_identifiers_count_as_missing() {
        let result = ProtocolPart::try_from_request(ProtocolPartRequest {
            part_id: Some("".to_string()),
            protocol_id: Some("P-1".to_string()),
            employee_id: None,
            station_id: None,
            status: None,
            status_timestamp: None,
            shipping_id: None,
        });
        assert!(result.is_err());
    }
}
