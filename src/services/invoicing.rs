//! Invoice generation and retrieval orchestration.
//!
//! The flow for generation: allocate a sequence for the target year, format
//! the invoice number, freeze the tax snapshot from the order, then persist
//! the invoice in a single uniqueness-guarded insert. Downloads re-render
//! the frozen snapshot on demand; the PDF is never stored.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::BusinessConfig;
use crate::error::AppError;
use crate::models::{Invoice, InvoiceStatus, ListInvoicesFilter};
use crate::services::invoice_number;
use crate::services::metrics::{ERRORS_TOTAL, INVOICES_GENERATED_TOTAL, INVOICE_DOWNLOADS_TOTAL};
use crate::services::render::{InvoiceRenderer, InvoiceTemplate};
use crate::services::retry::{retry_call, RetryConfig};
use crate::services::store::{InvoiceStore, SequenceStore};
use crate::services::tax::TaxSnapshotBuilder;
use crate::services::OrderStore;

/// A rendered document ready to stream to the client.
#[derive(Debug)]
pub struct RenderedInvoice {
    pub invoice_number: String,
    pub bytes: Vec<u8>,
}

impl RenderedInvoice {
    pub fn filename(&self) -> String {
        format!("invoice-{}.pdf", self.invoice_number)
    }
}

/// Orchestrates the invoicing components behind the admin surface.
pub struct InvoicingService {
    invoices: Arc<dyn InvoiceStore>,
    sequences: Arc<dyn SequenceStore>,
    orders: Arc<dyn OrderStore>,
    renderer: Arc<dyn InvoiceRenderer>,
    business: BusinessConfig,
    retry: RetryConfig,
}

impl InvoicingService {
    pub fn new(
        invoices: Arc<dyn InvoiceStore>,
        sequences: Arc<dyn SequenceStore>,
        orders: Arc<dyn OrderStore>,
        renderer: Arc<dyn InvoiceRenderer>,
        business: BusinessConfig,
    ) -> Self {
        Self {
            invoices,
            sequences,
            orders,
            renderer,
            business,
            retry: RetryConfig::quick(),
        }
    }

    /// Generate the invoice for an order.
    ///
    /// The year is passed in by the caller (derived from the wall clock at
    /// the API edge) so any year can be driven deterministically. At most
    /// one invoice ever exists per order; a concurrent duplicate request
    /// loses at the unique-index insert and surfaces as
    /// [`AppError::DuplicateInvoice`].
    #[instrument(skip(self), fields(order_ref = %order_ref, actor = %actor, year = year))]
    pub async fn generate(
        &self,
        order_ref: &str,
        actor: &str,
        year: i32,
    ) -> Result<Invoice, AppError> {
        // Friendly early exit; the unique index on order_ref is the actual
        // guard against the check-then-insert race.
        if let Some(existing) = self.invoices.get_by_order(order_ref).await? {
            INVOICES_GENERATED_TOTAL
                .with_label_values(&["duplicate"])
                .inc();
            return Err(AppError::DuplicateInvoice(anyhow::anyhow!(
                "An invoice already exists for order {}: {}",
                order_ref,
                existing.invoice_number
            )));
        }

        let order = self
            .orders
            .fetch_order(order_ref)
            .await?
            .ok_or_else(|| AppError::OrderNotFound(order_ref.to_string()))?;

        // Snapshot building is pure and cheap; do it before burning a
        // sequence value so a bad order leaves no gap.
        let snapshot = TaxSnapshotBuilder::new(&order, &self.business)
            .build()
            .inspect_err(|_| {
                INVOICES_GENERATED_TOTAL
                    .with_label_values(&["failed"])
                    .inc();
            })?;

        let sequence = retry_call(&self.retry, "next_sequence", || {
            self.sequences.next_sequence(year)
        })
        .await
        .inspect_err(|e| {
            ERRORS_TOTAL
                .with_label_values(&["sequence_allocation"])
                .inc();
            warn!(error = %e, "Sequence allocation failed");
        })?;

        let number = invoice_number::format(sequence);

        let invoice = self
            .invoices
            .create_if_absent(&crate::models::NewInvoice {
                invoice_number: number,
                order_ref: order_ref.to_string(),
                generated_by: actor.to_string(),
                snapshot,
            })
            .await
            .inspect_err(|e| {
                let outcome = match e {
                    AppError::DuplicateInvoice(_) => "duplicate",
                    _ => "failed",
                };
                INVOICES_GENERATED_TOTAL.with_label_values(&[outcome]).inc();
            })?;

        INVOICES_GENERATED_TOTAL
            .with_label_values(&["generated"])
            .inc();

        info!(
            invoice_number = %invoice.invoice_number,
            order_ref = %order_ref,
            "Invoice generated"
        );

        Ok(invoice)
    }

    /// Invoice status for an order, for the generate-vs-view decision.
    #[instrument(skip(self), fields(order_ref = %order_ref))]
    pub async fn status(&self, order_ref: &str) -> Result<InvoiceStatus, AppError> {
        Ok(self
            .invoices
            .get_by_order(order_ref)
            .await?
            .as_ref()
            .map(InvoiceStatus::from)
            .unwrap_or_else(InvoiceStatus::absent))
    }

    #[instrument(skip(self), fields(order_ref = %order_ref))]
    pub async fn get_by_order(&self, order_ref: &str) -> Result<Invoice, AppError> {
        self.invoices
            .get_by_order(order_ref)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No invoice for order {}", order_ref)))
    }

    #[instrument(skip(self), fields(invoice_number = %number))]
    pub async fn get_by_number(&self, number: &str) -> Result<Invoice, AppError> {
        if !invoice_number::validate(number) {
            return Err(AppError::MalformedInvoiceNumber(number.to_string()));
        }
        self.invoices
            .get_by_number(number)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No invoice numbered {}", number)))
    }

    #[instrument(skip(self, filter))]
    pub async fn list(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        self.invoices.list(filter).await
    }

    /// Download the document for an order's invoice.
    #[instrument(skip(self), fields(order_ref = %order_ref))]
    pub async fn download_by_order(&self, order_ref: &str) -> Result<RenderedInvoice, AppError> {
        let invoice = self.invoices.record_download(order_ref).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("No invoice for order {}", order_ref))
        })?;

        self.render(invoice).await
    }

    /// Download the document by invoice number.
    #[instrument(skip(self), fields(invoice_number = %number))]
    pub async fn download_by_number(&self, number: &str) -> Result<RenderedInvoice, AppError> {
        let invoice = self.get_by_number(number).await?;
        let order_ref = invoice.order_ref.clone();

        let invoice = self
            .invoices
            .record_download(&order_ref)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("No invoice for order {}", order_ref))
            })?;

        self.render(invoice).await
    }

    /// Render from the frozen snapshot. The download is recorded before
    /// this point; a rendering failure never rolls the invoice back, and a
    /// client that cancels mid-stream may leave the count one high. Both
    /// are accepted skew, not correctness bugs.
    async fn render(&self, invoice: Invoice) -> Result<RenderedInvoice, AppError> {
        let template = InvoiceTemplate::from_invoice(&invoice);

        let bytes = retry_call(&self.retry, "render_invoice", || {
            self.renderer.render(&template)
        })
        .await
        .inspect_err(|e| {
            INVOICE_DOWNLOADS_TOTAL.with_label_values(&["failed"]).inc();
            ERRORS_TOTAL.with_label_values(&["rendering"]).inc();
            warn!(error = %e, "Invoice rendering failed");
        })?;

        INVOICE_DOWNLOADS_TOTAL
            .with_label_values(&["rendered"])
            .inc();

        Ok(RenderedInvoice {
            invoice_number: invoice.invoice_number,
            bytes,
        })
    }
}
