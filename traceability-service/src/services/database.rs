//! Database service for traceability-service.
//!
//! Every write that changes a part's status goes through
//! [`write_status_event`], which keeps the three backing tables consistent:
//! the superseded `part_status` row is snapshotted into `h_part_status`,
//! `part_status` is upserted, and the event is appended to
//! `traceability_log`.

use crate::config::DatabaseConfig;
use crate::models::status::PartStatusRow;
use crate::models::{
    scan::ScanRow, CurrentStatus, GitterStatusChange, LineScan, ProtocolPart, StatusRecord,
    StatusUpdate,
};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// Full-outer-join projection of the live transaction log and the history
/// log, station names resolved from the lookup table. Most recent first.
const PART_HISTORY_QUERY: &str = r#"
    SELECT
        coalesce(tl.part_id, hps.part_id) AS part_id,
        cst.station_name AS station_id,
        coalesce(tl.status, hps.status) AS rezim_cteni,
        coalesce(tl.status_timestamp, hps.status_timestamp) AS "timestamp",
        coalesce(tl.employee_id, hps.employee_id) AS employee_id,
        coalesce(tl.shipping_id, hps.shipping_id) AS gitterbox_id,
        hps.status AS history_status,
        CASE WHEN hps.status IS NOT NULL THEN 'zmena statusu' END AS zmena
    FROM traceability_log tl
    FULL OUTER JOIN h_part_status hps
        ON tl.part_id = hps.part_id
        AND tl.status_timestamp = hps.status_timestamp
    LEFT JOIN c_station cst
        ON cst.station_id = coalesce(tl.station_id, hps.station_id)
    WHERE coalesce(tl.part_id, hps.part_id) = $1
    ORDER BY coalesce(tl.status_timestamp, hps.status_timestamp) DESC
"#;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(config), fields(service = "traceability-service"))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(crate::config::CONNECT_TIMEOUT_SECS))
            .idle_timeout(Duration::from_secs(600))
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Status lookups
    // =========================================================================

    /// Fetch the complete status history for a part. An unknown part yields
    /// an empty vec, not an error.
    #[instrument(skip(self))]
    pub async fn fetch_part_history(&self, part_id: &str) -> Result<Vec<StatusRecord>, AppError> {
        let rows = sqlx::query_as::<_, StatusRecord>(PART_HISTORY_QUERY)
            .bind(part_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch part history: {}", e))
            })?;

        Ok(rows)
    }

    /// Fetch the current status of a part from `part_status`.
    #[instrument(skip(self))]
    pub async fn fetch_current_status(
        &self,
        part_id: &str,
    ) -> Result<Option<CurrentStatus>, AppError> {
        let row = sqlx::query_as::<_, PartStatusRow>(
            r#"
            SELECT last_status, station_id, status_timestamp, create_timestamp, employee_id, shipping_id
            FROM part_status
            WHERE part_id = $1
            "#,
        )
        .bind(part_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch part status: {}", e))
        })?;

        Ok(row.map(|r| CurrentStatus::from_row(part_id, r)))
    }

    // =========================================================================
    // Status writes
    // =========================================================================

    /// Apply one status event for one part.
    #[instrument(skip(self, update), fields(part_id = %update.part_id))]
    pub async fn apply_status_update(&self, update: &StatusUpdate) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        write_status_event(&mut tx, update).await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to apply status update for part {}: {}",
                update.part_id,
                e
            ))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit status update: {}", e))
        })?;

        info!(part_id = %update.part_id, "Status update applied");
        Ok(())
    }

    /// Apply a status to every part travelling in a gitterbox, atomically.
    /// Returns the number of parts updated.
    #[instrument(skip(self, change), fields(shipping_id = %change.shipping_id))]
    pub async fn apply_gitter_status(&self, change: &GitterStatusChange) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let parts: Vec<String> = match change.current_workspace_id {
            Some(workspace_id) => {
                sqlx::query_scalar(
                    "SELECT part_id FROM part_status WHERE shipping_id = $1 AND station_id = $2",
                )
                .bind(&change.shipping_id)
                .bind(workspace_id)
                .fetch_all(&mut *tx)
                .await
            }
            None => {
                sqlx::query_scalar("SELECT part_id FROM part_status WHERE shipping_id = $1")
                    .bind(&change.shipping_id)
                    .fetch_all(&mut *tx)
                    .await
            }
        }
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list gitterbox parts: {}", e))
        })?;

        for part_id in &parts {
            let update = StatusUpdate {
                part_id: part_id.clone(),
                employee_id: None,
                station_id: change.station_id,
                status: change.status.clone(),
                status_timestamp: change.status_timestamp,
                shipping_id: Some(change.shipping_id.clone()),
            };
            write_status_event(&mut tx, &update).await.map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to update status for part {}: {}",
                    part_id,
                    e
                ))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit gitter status: {}", e))
        })?;

        info!(
            shipping_id = %change.shipping_id,
            parts = parts.len(),
            "Gitterbox status applied"
        );
        Ok(parts.len() as u64)
    }

    // =========================================================================
    // Forging-line scans
    // =========================================================================

    /// Record a forging-line scan. Timestamp is assigned by the database.
    #[instrument(skip(self, scan), fields(gitter_id = %scan.gitter_id))]
    pub async fn record_scan(&self, scan: &LineScan) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO kovaci_linka_scans (gitter_id, employee_id, "position")
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&scan.gitter_id)
        .bind(&scan.employee_id)
        .bind(scan.position.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to record scan: {}", e)))?;

        info!(gitter_id = %scan.gitter_id, position = %scan.position, "Scan recorded");
        Ok(())
    }

    /// Look up the most recent scan for a gitterbox.
    #[instrument(skip(self))]
    pub async fn find_latest_scan(&self, gitter_id: &str) -> Result<Option<ScanRow>, AppError> {
        let row = sqlx::query_as::<_, ScanRow>(
            r#"
            SELECT gitter_id, employee_id, "timestamp", "position"
            FROM kovaci_linka_scans
            WHERE gitter_id = $1
            ORDER BY "timestamp" DESC, scan_id DESC
            LIMIT 1
            "#,
        )
        .bind(gitter_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check gitter: {}", e)))?;

        Ok(row)
    }

    // =========================================================================
    // Protocol parts
    // =========================================================================

    /// Register a part under a measurement protocol.
    #[instrument(skip(self, part), fields(part_id = %part.part_id, protocol_id = %part.protocol_id))]
    pub async fn insert_protocol_part(&self, part: &ProtocolPart) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO protocol_parts
                (part_id, protocol_id, employee_id, station_id, status, status_timestamp, shipping_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&part.part_id)
        .bind(&part.protocol_id)
        .bind(&part.employee_id)
        .bind(part.station_id)
        .bind(&part.status)
        .bind(part.status_timestamp)
        .bind(&part.shipping_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to insert protocol part: {}", e))
        })?;

        info!(part_id = %part.part_id, protocol_id = %part.protocol_id, "Protocol part inserted");
        Ok(())
    }
}

/// Apply one status event inside an open transaction: snapshot the current
/// `part_status` row into the history log, upsert `part_status`, append to
/// `traceability_log`.
async fn write_status_event(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    update: &StatusUpdate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO h_part_status (part_id, status, station_id, status_timestamp, employee_id, shipping_id)
        SELECT part_id, last_status, station_id, status_timestamp, employee_id, shipping_id
        FROM part_status
        WHERE part_id = $1
        "#,
    )
    .bind(&update.part_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO part_status (part_id, last_status, station_id, status_timestamp, employee_id, shipping_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (part_id) DO UPDATE SET
            last_status = EXCLUDED.last_status,
            station_id = EXCLUDED.station_id,
            status_timestamp = EXCLUDED.status_timestamp,
            employee_id = EXCLUDED.employee_id,
            shipping_id = EXCLUDED.shipping_id
        "#,
    )
    .bind(&update.part_id)
    .bind(&update.status)
    .bind(update.station_id)
    .bind(update.status_timestamp)
    .bind(&update.employee_id)
    .bind(&update.shipping_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO traceability_log (part_id, employee_id, station_id, status, status_timestamp, shipping_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(&update.part_id)
    .bind(&update.employee_id)
    .bind(update.station_id)
    .bind(&update.status)
    .bind(update.status_timestamp)
    .bind(&update.shipping_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
