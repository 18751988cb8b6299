//! Read model of an order as consumed by invoice generation.
//!
//! Orders live in the commerce backend; this service only reads them through
//! the [`OrderStore`](crate::services::OrderStore) collaborator. The fields
//! here are the minimum required to freeze a snapshot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Postal address on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAddress {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub country: String,
}

/// Customer on an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// One order line with resolved product data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_name: String,
    /// HSN tax-classification code, falling back to the SKU upstream.
    pub hsn_code: String,
    pub quantity: u32,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discounted_price: Option<Decimal>,
    /// Per-item GST rate in percent; the configured default applies when absent.
    #[serde(default)]
    pub gst_rate: Option<Decimal>,
}

fn default_unit() -> String {
    "pcs".to_string()
}

/// Recipient override when the parcel goes to someone other than the
/// billing customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverOverride {
    pub name: String,
    pub phone: String,
}

/// Coupon applied to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCoupon {
    pub code: String,
    pub discount_amount: Decimal,
    pub discount_type: String,
}

/// An order as read from the commerce backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Stable identifier used as the invoice's order reference.
    pub order_ref: String,
    /// Human-readable order code shown on the document.
    pub order_code: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub customer: OrderCustomer,
    pub lines: Vec<OrderLine>,
    pub shipping_address: OrderAddress,
    /// None means billing is the same as shipping.
    #[serde(default)]
    pub billing_address: Option<OrderAddress>,
    #[serde(default)]
    pub receiver: Option<ReceiverOverride>,
    #[serde(default)]
    pub coupon: Option<OrderCoupon>,
    pub subtotal: Decimal,
    pub product_discount: Decimal,
    pub coupon_discount: Decimal,
    pub shipping_fee: Decimal,
}
