//! Domain models for gst-invoicing.

mod invoice;
mod order;
mod sequence;
mod snapshot;

pub use invoice::{Invoice, InvoiceState, InvoiceStatus, ListInvoicesFilter, NewInvoice};
pub use order::{
    OrderAddress, OrderCoupon, OrderCustomer, OrderLine, OrderRecord, ReceiverOverride,
};
pub use sequence::SequenceCounter;
pub use snapshot::{
    BusinessProfile, PricingBlock, SnapshotAddress, SnapshotCoupon, SnapshotCustomer,
    SnapshotLineItem, TaxComponent, TaxSnapshot,
};
