//! Status lookup handlers: InfoStatus (full history) and ReadStatus
//! (current status).

use crate::models::PartHistory;
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use service_core::error::AppError;

#[derive(Debug, Deserialize)]
pub struct PartIdParams {
    pub part_id: Option<String>,
}

/// `GET /InfoStatus` — full status history of a part, most recent first.
pub async fn info_status(
    State(state): State<AppState>,
    Query(params): Query<PartIdParams>,
    body: Bytes,
) -> Result<Response, AppError> {
    let part_id = resolve_part_id(params.part_id.as_deref(), &body).ok_or_else(missing_part_id)?;
    tracing::info!(part_id = %part_id, "Processing status history request");

    let records = state.db.fetch_part_history(&part_id).await?;
    if records.is_empty() {
        return Ok(no_record_response(&part_id));
    }

    Ok(Json(PartHistory {
        part_history: records,
    })
    .into_response())
}

/// `GET /readstatus` — current status of a part from `part_status`.
pub async fn read_status(
    State(state): State<AppState>,
    Query(params): Query<PartIdParams>,
    body: Bytes,
) -> Result<Response, AppError> {
    let part_id = resolve_part_id(params.part_id.as_deref(), &body).ok_or_else(missing_part_id)?;
    tracing::info!(part_id = %part_id, "Processing current status request");

    match state.db.fetch_current_status(&part_id).await? {
        Some(status) => Ok(Json(status).into_response()),
        None => Ok(no_record_response(&part_id)),
    }
}

/// Resolve the part identifier: the query string wins, the body is only
/// consulted when the query has no usable value, and a malformed or absent
/// body counts as "no value", never as an error.
fn resolve_part_id(query_value: Option<&str>, body: &[u8]) -> Option<String> {
    if let Some(id) = query_value.filter(|v| !v.is_empty()) {
        return Some(id.to_string());
    }

    let parsed: serde_json::Value = serde_json::from_slice(body).ok()?;
    parsed
        .get("part_id")?
        .as_str()
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn missing_part_id() -> AppError {
    AppError::BadRequest(anyhow::anyhow!(
        "Please pass part_id in the query string or request body"
    ))
}

/// "No rows" is informational, not an error: the frontends show the message
/// and keep polling, so this stays a 200.
fn no_record_response(part_id: &str) -> Response {
    Json(json!({
        "message": format!("No record found for part ID: {}", part_id)
    }))
    .into_response()
}
