//! Postgres persistence for gst-invoicing.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Invoice, ListInvoicesFilter, NewInvoice, SequenceCounter};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::{InvoiceStore, SequenceStore};

const INVOICE_COLUMNS: &str = "invoice_id, invoice_number, order_ref, generated_at, generated_by, \
     snapshot, state, download_count, last_downloaded_at";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "gst-invoicing"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
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
}

#[async_trait]
impl SequenceStore for Database {
    /// Atomic increment-and-fetch against the per-year counter row.
    ///
    /// The upsert creates the row on first use and increments in the same
    /// statement, so concurrent callers serialize on the row lock and each
    /// observes a distinct value. Never a separate read followed by a write.
    #[instrument(skip(self), fields(year = year))]
    async fn next_sequence(&self, year: i32) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["next_sequence"])
            .start_timer();

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO invoice_sequences (year, sequence, updated_utc)
            VALUES ($1, 1, NOW())
            ON CONFLICT (year)
            DO UPDATE SET sequence = invoice_sequences.sequence + 1, updated_utc = NOW()
            RETURNING sequence
            "#,
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::SequenceAllocation(anyhow::anyhow!(
                "Failed to allocate sequence for year {}: {}",
                year,
                e
            ))
        })?;

        timer.observe_duration();

        info!(year = year, sequence = sequence, "Sequence allocated");

        Ok(sequence)
    }

    #[instrument(skip(self), fields(year = year))]
    async fn current_sequence(&self, year: i32) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["current_sequence"])
            .start_timer();

        let counter = sqlx::query_as::<_, SequenceCounter>(
            r#"
            SELECT year, sequence, updated_utc
            FROM invoice_sequences
            WHERE year = $1
            "#,
        )
        .bind(year)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::SequenceAllocation(anyhow::anyhow!(
                "Failed to read sequence for year {}: {}",
                year,
                e
            ))
        })?;

        timer.observe_duration();

        Ok(counter.map(|c| c.sequence).unwrap_or(0))
    }

    /// Reset only under a maintenance window: a reset concurrent with an
    /// allocation for the same year can reissue a value.
    #[instrument(skip(self), fields(year = year))]
    async fn reset_sequence(&self, year: i32) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["reset_sequence"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO invoice_sequences (year, sequence, updated_utc)
            VALUES ($1, 0, NOW())
            ON CONFLICT (year)
            DO UPDATE SET sequence = 0, updated_utc = NOW()
            "#,
        )
        .bind(year)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::SequenceAllocation(anyhow::anyhow!(
                "Failed to reset sequence for year {}: {}",
                year,
                e
            ))
        })?;

        timer.observe_duration();

        info!(year = year, "Sequence reset to 0");

        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for Database {
    /// Insert the invoice, relying on the UNIQUE indexes on `order_ref` and
    /// `invoice_number` to reject concurrent duplicates. Any earlier
    /// existence check is advisory only; this insert is the safety net.
    #[instrument(skip(self, input), fields(order_ref = %input.order_ref, invoice_number = %input.invoice_number))]
    async fn create_if_absent(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let invoice_id = Uuid::new_v4();
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            INSERT INTO invoices (
                invoice_id, invoice_number, order_ref, generated_by, snapshot, state
            )
            VALUES ($1, $2, $3, $4, $5, 'generated')
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(invoice_id)
        .bind(&input.invoice_number)
        .bind(&input.order_ref)
        .bind(&input.generated_by)
        .bind(Json(&input.snapshot))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateInvoice(anyhow::anyhow!(
                    "An invoice already exists for order {}",
                    input.order_ref
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)),
        })?;

        timer.observe_duration();

        info!(
            invoice_id = %invoice.invoice_id,
            invoice_number = %invoice.invoice_number,
            "Invoice created"
        );

        Ok(invoice)
    }

    #[instrument(skip(self), fields(order_ref = %order_ref))]
    async fn get_by_order(&self, order_ref: &str) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_by_order"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE order_ref = $1
            "#,
        ))
        .bind(order_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_number = %invoice_number))]
    async fn get_by_number(&self, invoice_number: &str) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_by_number"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            SELECT {INVOICE_COLUMNS}
            FROM invoices
            WHERE invoice_number = $1
            "#,
        ))
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self, filter))]
    async fn list(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let limit = filter.page_size.clamp(1, 100) as i64;
        let state_str = filter.state.map(|s| s.as_str().to_string());

        let invoices = if let Some(cursor) = filter.page_token {
            sqlx::query_as::<_, Invoice>(&format!(
                r#"
                SELECT {INVOICE_COLUMNS}
                FROM invoices
                WHERE ($1::text IS NULL OR state = $1)
                  AND invoice_id > $2
                ORDER BY invoice_id
                LIMIT $3
                "#,
            ))
            .bind(&state_str)
            .bind(cursor)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Invoice>(&format!(
                r#"
                SELECT {INVOICE_COLUMNS}
                FROM invoices
                WHERE ($1::text IS NULL OR state = $1)
                ORDER BY invoice_id
                LIMIT $2
                "#,
            ))
            .bind(&state_str)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Single atomic UPDATE expressing the lifecycle rule: the counter and
    /// timestamp always advance, the state moves to `downloaded` only from
    /// `generated`, and nothing ever reverts.
    #[instrument(skip(self), fields(order_ref = %order_ref))]
    async fn record_download(&self, order_ref: &str) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_download"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            r#"
            UPDATE invoices
            SET download_count = download_count + 1,
                last_downloaded_at = NOW(),
                state = CASE WHEN state = 'generated' THEN 'downloaded' ELSE state END
            WHERE order_ref = $1
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(order_ref)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to record download: {}", e))
        })?;

        timer.observe_duration();

        if let Some(ref inv) = invoice {
            info!(
                invoice_number = %inv.invoice_number,
                download_count = inv.download_count,
                "Invoice download recorded"
            );
        }

        Ok(invoice)
    }
}
