//! Services for gst-invoicing.

mod database;
pub mod invoice_number;
mod invoicing;
pub mod metrics;
mod orders;
mod render;
pub mod retry;
mod store;
pub mod tax;
pub mod words;

pub use database::Database;
pub use invoicing::{InvoicingService, RenderedInvoice};
pub use metrics::{get_metrics, init_metrics};
pub use orders::{HttpOrderStore, OrderStore};
pub use render::{HttpRenderer, InvoiceRenderer, InvoiceTemplate, TemplateLineItem};
pub use store::{InvoiceStore, SequenceStore};
