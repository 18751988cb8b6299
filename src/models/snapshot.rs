//! Frozen point-in-time invoice snapshot.
//!
//! Everything needed to render the invoice document is copied into this
//! structure at generation time. The snapshot is persisted as JSONB and is
//! never recomputed, so later edits to the source order or to the business
//! configuration cannot change an issued invoice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Seller identity and registration details, copied from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
    pub gstin: String,
    pub pan: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub bank_name: String,
    pub bank_account_number: String,
    pub bank_ifsc: String,
    pub bank_branch: String,
}

/// Buyer identity at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Postal address copied from the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
}

/// One invoice line with its per-line tax, rounded independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLineItem {
    pub name: String,
    /// HSN classification code (or SKU where no HSN is assigned).
    pub hsn_code: String,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: Decimal,
    pub discounted_unit_price: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub line_total: Decimal,
}

/// A single GST component: the rate it was levied at and the amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaxComponent {
    pub rate: Decimal,
    pub amount: Decimal,
}

impl TaxComponent {
    pub fn zero() -> Self {
        Self {
            rate: Decimal::ZERO,
            amount: Decimal::ZERO,
        }
    }
}

/// The frozen pricing block.
///
/// Intra-state supplies carry CGST + SGST (each half the nominal rate);
/// inter-state supplies carry IGST at the full nominal rate. The unused
/// components are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBlock {
    pub subtotal: Decimal,
    pub product_discount: Decimal,
    pub coupon_discount: Decimal,
    pub shipping_fee: Decimal,
    pub taxable_amount: Decimal,
    pub cgst: TaxComponent,
    pub sgst: TaxComponent,
    pub igst: TaxComponent,
    pub total_tax: Decimal,
    pub grand_total: Decimal,
    pub rounding_adjustment: Decimal,
    pub final_amount: Decimal,
    pub amount_in_words: String,
}

/// Coupon applied to the order, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCoupon {
    pub code: String,
    pub discount_amount: Decimal,
    pub discount_type: String,
}

/// The complete frozen snapshot embedded in an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSnapshot {
    pub business: BusinessProfile,

    pub order_code: String,
    pub order_date: DateTime<Utc>,
    pub order_status: String,
    pub payment_method: String,
    pub payment_status: String,

    pub customer: SnapshotCustomer,
    pub items: Vec<SnapshotLineItem>,

    pub shipping_address: SnapshotAddress,
    pub billing_address: SnapshotAddress,
    /// True when the parcel recipient differs from the billing customer.
    pub ships_to_different_recipient: bool,
    pub receiver_name: Option<String>,
    pub receiver_phone: Option<String>,

    pub pricing: PricingBlock,
    pub coupon: Option<SnapshotCoupon>,
}
