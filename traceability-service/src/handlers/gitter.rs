//! Gitterbox handlers: status change, forging-line scan, existence check.

use crate::handlers::parse_json_body;
use crate::models::{scan::ScanRequest, GitterCheck, GitterStatusChange, LineScan};
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use service_core::error::AppError;

/// `POST /ChangeStatus` — apply a status to every part in a gitterbox.
/// Database failures surface the raw driver text, which the line terminals
/// display to maintenance staff.
pub async fn change_status(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let change: GitterStatusChange = parse_json_body(&body)?;
    tracing::info!(shipping_id = %change.shipping_id, "Processing gitterbox status change");

    let updated = state.db.apply_gitter_status(&change).await?;
    tracing::info!(shipping_id = %change.shipping_id, updated, "Gitterbox status change applied");

    Ok(Json(json!({"message": "Status updated successfully"})))
}

/// `POST /KovaciLinkaScan` — record a forging-line scan.
pub async fn kovaci_linka_scan(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let request: ScanRequest = parse_json_body(&body)?;
    let scan = LineScan::try_from_request(request)?;
    tracing::info!(gitter_id = %scan.gitter_id, position = %scan.position, "Processing scan");

    state.db.record_scan(&scan).await.map_err(|e| {
        tracing::error!(gitter_id = %scan.gitter_id, error = %e, "Error processing scan");
        AppError::OperationFailed("Failed to process scan".to_string())
    })?;

    Ok(Json(json!({"message": "Scan saved successfully"})))
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub gitter_id: Option<String>,
}

/// `POST /KovaciLinkaCheck` — look up the most recent scan for a gitterbox.
/// An unknown gitterbox is a 200 with `exists: false`; the scanner blinks
/// green on that answer.
pub async fn kovaci_linka_check(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let request: CheckRequest = parse_json_body(&body)?;

    let gitter_id = request.gitter_id.ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("Missing required field: gitter_id"))
    })?;
    let gitter_id = gitter_id.trim();
    if gitter_id.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "gitter_id cannot be empty"
        )));
    }

    tracing::info!(gitter_id = %gitter_id, "Processing gitterbox check");

    let latest = state.db.find_latest_scan(gitter_id).await.map_err(|e| {
        tracing::error!(gitter_id = %gitter_id, error = %e, "Error checking gitter_id");
        AppError::OperationFailed("Failed to check gitter_id".to_string())
    })?;

    match latest {
        Some(row) => Ok(Json(GitterCheck::from(row)).into_response()),
        None => Ok(Json(json!({
            "exists": false,
            "message": "Gitter ID not found"
        }))
        .into_response()),
    }
}
