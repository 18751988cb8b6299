//! GST computation and snapshot construction.
//!
//! The arithmetic here is deliberately split from formatting: everything in
//! this module works on `Decimal` rupee amounts and copies plain fields; all
//! display-string concerns (currency formatting, date formats) live in the
//! rendering gateway.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::instrument;

use crate::config::BusinessConfig;
use crate::error::AppError;
use crate::models::{
    OrderRecord, PricingBlock, SnapshotAddress, SnapshotCoupon, SnapshotCustomer, SnapshotLineItem,
    TaxComponent, TaxSnapshot,
};
use crate::services::words;

/// Round to the nearest integer rupee, half away from zero.
///
/// Applied independently per line; the sum of line taxes can therefore
/// differ by a rupee from a tax computed on the aggregate. That is the
/// intended behavior for line-item display fidelity.
pub fn round_rupees(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Tax for one line: `line_total * rate / 100`, rounded to whole rupees.
pub fn line_tax(line_total: Decimal, rate: Decimal) -> Decimal {
    round_rupees(line_total * rate / Decimal::from(100))
}

/// A supply is intra-state when the business's registered state matches the
/// shipment destination state (trimmed, case-insensitive).
pub fn is_intra_state(business_state: &str, destination_state: &str) -> bool {
    business_state
        .trim()
        .eq_ignore_ascii_case(destination_state.trim())
}

/// CGST/SGST/IGST components for a computed total tax.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GstSplit {
    pub cgst: TaxComponent,
    pub sgst: TaxComponent,
    pub igst: TaxComponent,
}

/// Split the total tax across GST components.
///
/// Intra-state: CGST and SGST each at half the nominal rate; CGST takes
/// `round(total / 2)` and SGST takes the remainder so the two always sum to
/// the total. Inter-state: IGST carries the full amount at the full rate.
pub fn split_gst(total_tax: Decimal, nominal_rate: Decimal, intra_state: bool) -> GstSplit {
    if intra_state {
        let half_rate = nominal_rate / Decimal::from(2);
        let cgst_amount = round_rupees(total_tax / Decimal::from(2));
        GstSplit {
            cgst: TaxComponent {
                rate: half_rate,
                amount: cgst_amount,
            },
            sgst: TaxComponent {
                rate: half_rate,
                amount: total_tax - cgst_amount,
            },
            igst: TaxComponent::zero(),
        }
    } else {
        GstSplit {
            cgst: TaxComponent::zero(),
            sgst: TaxComponent::zero(),
            igst: TaxComponent {
                rate: nominal_rate,
                amount: total_tax,
            },
        }
    }
}

/// Builds the frozen snapshot from an order and the business configuration.
pub struct TaxSnapshotBuilder<'a> {
    order: &'a OrderRecord,
    business: &'a BusinessConfig,
}

impl<'a> TaxSnapshotBuilder<'a> {
    pub fn new(order: &'a OrderRecord, business: &'a BusinessConfig) -> Self {
        Self { order, business }
    }

    /// Produce the snapshot, or fail without side effects.
    ///
    /// A failure here aborts generation entirely; no partial invoice is
    /// ever persisted.
    #[instrument(skip(self), fields(order_ref = %self.order.order_ref))]
    pub fn build(&self) -> Result<TaxSnapshot, AppError> {
        self.check_required_fields()?;

        let default_rate = self.business.default_gst_rate;
        let items: Vec<SnapshotLineItem> = self
            .order
            .lines
            .iter()
            .map(|line| {
                let unit_price = line.discounted_price.unwrap_or(line.unit_price);
                let line_total = unit_price * Decimal::from(line.quantity);
                let tax_rate = line.gst_rate.unwrap_or(default_rate);
                SnapshotLineItem {
                    name: line.product_name.clone(),
                    hsn_code: line.hsn_code.clone(),
                    quantity: line.quantity,
                    unit: line.unit.clone(),
                    unit_price: line.unit_price,
                    discounted_unit_price: unit_price,
                    tax_rate,
                    tax_amount: line_tax(line_total, tax_rate),
                    line_total,
                }
            })
            .collect();

        let taxable_amount = self.order.subtotal - self.order.product_discount
            - self.order.coupon_discount
            + self.order.shipping_fee;
        let total_tax: Decimal = items.iter().map(|item| item.tax_amount).sum();

        // The split rate is the order-level nominal rate: the highest rate
        // any line carries, or the configured default for rate-less orders.
        let nominal_rate = items
            .iter()
            .map(|item| item.tax_rate)
            .max()
            .unwrap_or(default_rate);

        let intra_state = is_intra_state(&self.business.state, &self.order.shipping_address.state);
        let split = split_gst(total_tax, nominal_rate, intra_state);

        let grand_total = taxable_amount + total_tax;
        let final_amount = round_rupees(grand_total);
        let rounding_adjustment = final_amount - grand_total;

        let amount_in_words = words::amount_in_words(final_amount)
            .unwrap_or_else(|| words::numeric_fallback(final_amount));

        let shipping_address = address_from_order(&self.order.shipping_address);
        let billing_address = self
            .order
            .billing_address
            .as_ref()
            .map(address_from_order)
            .unwrap_or_else(|| shipping_address.clone());

        Ok(TaxSnapshot {
            business: self.business.to_profile(),
            order_code: self.order.order_code.clone(),
            order_date: self.order.created_at,
            order_status: self.order.status.clone(),
            payment_method: self.order.payment_method.clone(),
            payment_status: self.order.payment_status.clone(),
            customer: SnapshotCustomer {
                name: self.order.customer.name.clone(),
                email: self.order.customer.email.clone(),
                phone: self.order.customer.phone.clone(),
            },
            items,
            shipping_address,
            billing_address,
            ships_to_different_recipient: self.order.receiver.is_some(),
            receiver_name: self.order.receiver.as_ref().map(|r| r.name.clone()),
            receiver_phone: self.order.receiver.as_ref().map(|r| r.phone.clone()),
            pricing: PricingBlock {
                subtotal: self.order.subtotal,
                product_discount: self.order.product_discount,
                coupon_discount: self.order.coupon_discount,
                shipping_fee: self.order.shipping_fee,
                taxable_amount,
                cgst: split.cgst,
                sgst: split.sgst,
                igst: split.igst,
                total_tax,
                grand_total,
                rounding_adjustment,
                final_amount,
                amount_in_words,
            },
            coupon: self.order.coupon.as_ref().map(|coupon| SnapshotCoupon {
                code: coupon.code.clone(),
                discount_amount: coupon.discount_amount,
                discount_type: coupon.discount_type.clone(),
            }),
        })
    }

    fn check_required_fields(&self) -> Result<(), AppError> {
        let missing = |field: &str| {
            AppError::IncompleteOrderData(anyhow::anyhow!(
                "order {} is missing required field: {}",
                self.order.order_ref,
                field
            ))
        };

        if self.order.customer.name.trim().is_empty() {
            return Err(missing("customer.name"));
        }
        if self.order.lines.is_empty() {
            return Err(missing("lines"));
        }

        let address = &self.order.shipping_address;
        if address.line1.trim().is_empty() {
            return Err(missing("shipping_address.line1"));
        }
        if address.city.trim().is_empty() {
            return Err(missing("shipping_address.city"));
        }
        if address.state.trim().is_empty() {
            return Err(missing("shipping_address.state"));
        }
        if address.pincode.trim().is_empty() {
            return Err(missing("shipping_address.pincode"));
        }

        Ok(())
    }
}

fn address_from_order(address: &crate::models::OrderAddress) -> SnapshotAddress {
    SnapshotAddress {
        line1: address.line1.clone(),
        line2: address.line2.clone(),
        city: address.city.clone(),
        state: address.state.clone(),
        pincode: address.pincode.clone(),
        country: address.country.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_rupees(d("94.5")), d("95"));
        assert_eq!(round_rupees(d("94.4")), d("94"));
        assert_eq!(round_rupees(d("94.6")), d("95"));
    }

    #[test]
    fn line_tax_rounds_per_line() {
        assert_eq!(line_tax(d("600"), d("18")), d("108"));
        assert_eq!(line_tax(d("450"), d("18")), d("81"));
        // 333 * 18% = 59.94 -> 60
        assert_eq!(line_tax(d("333"), d("18")), d("60"));
    }

    #[test]
    fn intra_state_comparison_ignores_case_and_whitespace() {
        assert!(is_intra_state("Maharashtra", " maharashtra "));
        assert!(!is_intra_state("Maharashtra", "Karnataka"));
    }

    #[test]
    fn intra_state_split_sums_to_total() {
        let split = split_gst(d("189"), d("18"), true);
        assert_eq!(split.cgst.rate, d("9"));
        assert_eq!(split.sgst.rate, d("9"));
        assert_eq!(split.cgst.amount, d("95"));
        assert_eq!(split.sgst.amount, d("94"));
        assert_eq!(split.cgst.amount + split.sgst.amount, d("189"));
        assert_eq!(split.igst.amount, Decimal::ZERO);
    }

    #[test]
    fn inter_state_split_uses_igst_only() {
        let split = split_gst(d("189"), d("18"), false);
        assert_eq!(split.igst.rate, d("18"));
        assert_eq!(split.igst.amount, d("189"));
        assert_eq!(split.cgst.amount, Decimal::ZERO);
        assert_eq!(split.sgst.amount, Decimal::ZERO);
    }
}
