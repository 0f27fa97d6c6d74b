pub mod app;
pub mod gitter;
pub mod protocol;
pub mod status;

use serde::de::DeserializeOwned;
use service_core::error::AppError;

/// Parse a mandatory JSON body. Used by the POST endpoints, where a
/// malformed body is a client error with a fixed message.
pub(crate) fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::warn!(error = %e, "Invalid request body, expected JSON");
        AppError::BadRequest(anyhow::anyhow!("Invalid JSON format"))
    })
}
