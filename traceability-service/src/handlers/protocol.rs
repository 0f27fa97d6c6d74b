//! Protocol part registration handler.

use crate::handlers::parse_json_body;
use crate::models::{protocol::ProtocolPartRequest, ProtocolPart};
use crate::startup::AppState;
use axum::{body::Bytes, extract::State, http::header::CONTENT_TYPE, http::HeaderMap, Json};
use service_core::error::AppError;

/// `POST /ProtocolPartInsert` — register a part under a measurement
/// protocol. This endpoint insists on an explicit JSON content type; the
/// measurement clients have historically sent form-encoded bodies by
/// mistake.
pub async fn protocol_part_insert(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("application/json") {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Content-Type must be application/json"
        )));
    }

    let request: ProtocolPartRequest = parse_json_body(&body)?;
    let part = ProtocolPart::try_from_request(request)?;
    tracing::info!(
        part_id = %part.part_id,
        protocol_id = %part.protocol_id,
        "Processing protocol part registration"
    );

    state.db.insert_protocol_part(&part).await.map_err(|e| {
        tracing::error!(part_id = %part.part_id, error = %e, "Error inserting protocol part");
        AppError::OperationFailed("Database connection error. Check logs for details.".to_string())
    })?;

    Ok(Json(serde_json::json!({
        "message": "Protocol part data inserted successfully"
    })))
}
