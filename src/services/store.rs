//! Storage seams for the orchestration layer.
//!
//! The production implementation of both traits is the Postgres-backed
//! [`Database`](crate::services::Database); tests substitute an in-memory
//! double. Whatever the backing store, the contracts below must hold: the
//! counter increment is a single atomic read-increment-return, and invoice
//! creation is guarded by storage-level uniqueness on the order reference
//! and the invoice number.

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Invoice, ListInvoicesFilter, NewInvoice};

/// Per-year invoice sequence allocation.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Allocate the next sequence value for a year.
    ///
    /// Concurrent callers for the same year must each observe a distinct,
    /// strictly increasing value. The counter row is created lazily.
    async fn next_sequence(&self, year: i32) -> Result<i64, AppError>;

    /// Non-incrementing peek at the last issued value (0 when none).
    async fn current_sequence(&self, year: i32) -> Result<i64, AppError>;

    /// Administrative reset to 0. A reset racing an in-flight allocation can
    /// reissue a value, so this must only run inside a maintenance window.
    async fn reset_sequence(&self, year: i32) -> Result<(), AppError>;
}

/// Invoice persistence with uniqueness enforcement.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Insert a new invoice, failing with [`AppError::DuplicateInvoice`]
    /// when one already exists for the order reference (or, pathologically,
    /// the invoice number).
    async fn create_if_absent(&self, input: &NewInvoice) -> Result<Invoice, AppError>;

    async fn get_by_order(&self, order_ref: &str) -> Result<Option<Invoice>, AppError>;

    async fn get_by_number(&self, invoice_number: &str) -> Result<Option<Invoice>, AppError>;

    async fn list(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError>;

    /// Record a successful document retrieval: bump the download counter,
    /// stamp the time, and advance `generated -> downloaded` (states past
    /// `downloaded` are left alone). Returns the updated invoice, or `None`
    /// when the order has no invoice.
    async fn record_download(&self, order_ref: &str) -> Result<Option<Invoice>, AppError>;
}
