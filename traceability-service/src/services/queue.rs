//! Operations-log queue consumer.
//!
//! Line stations push status events onto a Redis list instead of calling
//! the HTTP surface; this consumer drains that list and applies each event
//! with the same transactional write the ChangeStatus endpoint uses.
//! Malformed messages are logged and dropped; failed database writes are
//! logged and not retried.

use crate::config::QueueConfig;
use crate::models::StatusUpdate;
use crate::services::Database;
use redis::aio::ConnectionManager;
use service_core::error::AppError;
use std::time::Duration;
use tracing::{error, info};

/// Seconds a BLPOP blocks before the loop comes back around.
const POLL_TIMEOUT_SECS: u64 = 5;

pub struct QueueConsumer {
    manager: ConnectionManager,
    queue_name: String,
    db: Database,
}

impl QueueConsumer {
    /// Connect the consumer. Returns `None` when no Redis URL is configured,
    /// which disables queue processing for the deployment.
    pub async fn connect(config: &QueueConfig, db: Database) -> Result<Option<Self>, AppError> {
        let Some(url) = &config.redis_url else {
            info!("No Redis URL configured, queue consumer disabled");
            return Ok(None);
        };

        let client = redis::Client::open(url.as_str())
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid Redis URL: {}", e)))?;

        let manager = client.get_connection_manager().await.map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Failed to connect to Redis: {}", e))
        })?;

        info!(queue = %config.queue_name, "Queue consumer connected to Redis");

        Ok(Some(QueueConsumer {
            manager,
            queue_name: config.queue_name.clone(),
            db,
        }))
    }

    /// Drain the queue until the process shuts down.
    pub async fn run(mut self) {
        info!(queue = %self.queue_name, "Queue consumer started");

        loop {
            match self.next_message().await {
                Ok(Some(payload)) => self.handle_message(&payload).await,
                Ok(None) => {} // poll timeout, go around again
                Err(e) => {
                    error!(error = %e, "Queue read failed, backing off");
                    tokio::time::sleep(Duration::from_secs(POLL_TIMEOUT_SECS)).await;
                }
            }
        }
    }

    async fn next_message(&mut self) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.manager.clone();
        let reply: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(&self.queue_name)
            .arg(POLL_TIMEOUT_SECS)
            .query_async(&mut conn)
            .await?;

        Ok(reply.map(|(_list, payload)| payload))
    }

    async fn handle_message(&self, payload: &str) {
        let update = match parse_message(payload) {
            Ok(update) => update,
            Err(e) => {
                error!(error = %e, "Invalid queue message, expected JSON status update");
                return;
            }
        };

        info!(part_id = %update.part_id, "Processing queued status update");

        if let Err(e) = self.db.apply_status_update(&update).await {
            error!(
                part_id = %update.part_id,
                error = %e,
                "Failed to apply queued status update"
            );
        }
    }
}

fn parse_message(payload: &str) -> Result<StatusUpdate, serde_json::Error> {
    serde_json::from_str(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_message_parses() {
        let update = parse_message(
            r#"{"part_id": "ABC123", "employee_id": "E42", "station_id": 3,
                "status": "OK", "status_timestamp": "2024-01-01T10:00:00",
                "shipping_id": "G-7"}"#,
        )
        .expect("Message should parse");

        assert_eq!(update.part_id, "ABC123");
        assert_eq!(update.shipping_id.as_deref(), Some("G-7"));
    }

    #[test]
    fn message_without_part_id_is_rejected() {
        assert!(parse_message(r#"{"status": "OK"}"#).is_err());
    }

    #[test]
    fn non_json_message_is_rejected() {
        assert!(parse_message("part_id=ABC123").is_err());
    }
}
