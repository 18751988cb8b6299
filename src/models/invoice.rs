//! Invoice model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use super::snapshot::TaxSnapshot;

/// Invoice lifecycle state.
///
/// `Generated` is set at creation. Every successful document retrieval moves
/// the invoice to `Downloaded` (re-entrant). `Sent` is reserved for a future
/// email-delivery feature and is not reachable by any current operation.
/// No transition ever reverts to `Generated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceState {
    Generated,
    Downloaded,
    Sent,
}

impl InvoiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceState::Generated => "generated",
            InvoiceState::Downloaded => "downloaded",
            InvoiceState::Sent => "sent",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "downloaded" => InvoiceState::Downloaded,
            "sent" => InvoiceState::Sent,
            _ => InvoiceState::Generated,
        }
    }

    /// State after a successful download. States past `Downloaded` are left
    /// unchanged.
    pub fn on_download(self) -> Self {
        match self {
            InvoiceState::Generated | InvoiceState::Downloaded => InvoiceState::Downloaded,
            InvoiceState::Sent => InvoiceState::Sent,
        }
    }
}

/// Invoice record. One per order, created once; the embedded snapshot is
/// never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub order_ref: String,
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
    pub snapshot: Json<TaxSnapshot>,
    pub state: String,
    pub download_count: i32,
    pub last_downloaded_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn state(&self) -> InvoiceState {
        InvoiceState::from_string(&self.state)
    }
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub order_ref: String,
    pub generated_by: String,
    pub snapshot: TaxSnapshot,
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub state: Option<InvoiceState>,
    pub page_size: i32,
    pub page_token: Option<Uuid>,
}

/// Lightweight status view for the admin UI.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceStatus {
    pub exists: bool,
    pub invoice_number: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
    pub state: Option<InvoiceState>,
    pub download_count: i32,
    pub last_downloaded_at: Option<DateTime<Utc>>,
}

impl InvoiceStatus {
    pub fn absent() -> Self {
        Self {
            exists: false,
            invoice_number: None,
            generated_at: None,
            state: None,
            download_count: 0,
            last_downloaded_at: None,
        }
    }
}

impl From<&Invoice> for InvoiceStatus {
    fn from(invoice: &Invoice) -> Self {
        Self {
            exists: true,
            invoice_number: Some(invoice.invoice_number.clone()),
            generated_at: Some(invoice.generated_at),
            state: Some(invoice.state()),
            download_count: invoice.download_count,
            last_downloaded_at: invoice.last_downloaded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_transition_is_reentrant() {
        assert_eq!(
            InvoiceState::Generated.on_download(),
            InvoiceState::Downloaded
        );
        assert_eq!(
            InvoiceState::Downloaded.on_download(),
            InvoiceState::Downloaded
        );
    }

    #[test]
    fn download_transition_never_reverts_sent() {
        assert_eq!(InvoiceState::Sent.on_download(), InvoiceState::Sent);
    }

    #[test]
    fn state_round_trips_through_strings() {
        for state in [
            InvoiceState::Generated,
            InvoiceState::Downloaded,
            InvoiceState::Sent,
        ] {
            assert_eq!(InvoiceState::from_string(state.as_str()), state);
        }
    }
}
