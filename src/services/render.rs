//! Document rendering gateway.
//!
//! Rendering is a black box behind [`InvoiceRenderer`]: the service hands
//! over a flat, display-ready template record and gets back PDF bytes.
//! Documents are never stored; every download re-renders from the frozen
//! snapshot. All display formatting (dates, currency strings) happens here,
//! keeping the tax computation purely numeric.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::instrument;

use crate::error::AppError;
use crate::models::{Invoice, SnapshotAddress, TaxSnapshot};
use crate::services::metrics::RENDER_DURATION;

/// Renders an invoice template into a document byte stream.
#[async_trait]
pub trait InvoiceRenderer: Send + Sync {
    async fn render(&self, template: &InvoiceTemplate) -> Result<Vec<u8>, AppError>;
}

/// One display-ready line row.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateLineItem {
    pub name: String,
    pub hsn_code: String,
    pub quantity: String,
    pub unit: String,
    pub unit_price: String,
    pub discounted_unit_price: String,
    pub tax_rate: String,
    pub tax_amount: String,
    pub line_total: String,
}

/// The flat record handed to the rendering collaborator. Every amount is a
/// pre-formatted display string.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceTemplate {
    pub invoice_number: String,
    pub invoice_date: String,

    pub business_name: String,
    pub business_address: String,
    pub business_gstin: String,
    pub business_pan: String,
    pub business_phone: String,
    pub business_email: String,
    pub business_website: String,
    pub bank_name: String,
    pub bank_account_number: String,
    pub bank_ifsc: String,
    pub bank_branch: String,

    pub order_code: String,
    pub order_date: String,
    pub payment_method: String,
    pub payment_status: String,

    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,

    pub shipping_address: String,
    pub billing_address: String,
    pub ships_to_different_recipient: bool,
    pub receiver_name: String,
    pub receiver_phone: String,

    pub items: Vec<TemplateLineItem>,

    pub subtotal: String,
    pub product_discount: String,
    pub coupon_discount: String,
    pub shipping_fee: String,
    pub taxable_amount: String,
    pub cgst_rate: String,
    pub cgst_amount: String,
    pub sgst_rate: String,
    pub sgst_amount: String,
    pub igst_rate: String,
    pub igst_amount: String,
    pub total_tax: String,
    pub grand_total: String,
    pub rounding_adjustment: String,
    pub final_amount: String,
    pub amount_in_words: String,

    pub coupon_code: String,
    pub coupon_discount_type: String,
}

impl InvoiceTemplate {
    /// Build the template from a persisted invoice. Reads only the frozen
    /// snapshot, never the source order.
    pub fn from_invoice(invoice: &Invoice) -> Self {
        let snapshot: &TaxSnapshot = &invoice.snapshot;
        let pricing = &snapshot.pricing;
        let business = &snapshot.business;

        Self {
            invoice_number: invoice.invoice_number.clone(),
            invoice_date: format_date(invoice.generated_at),

            business_name: business.name.clone(),
            business_address: format!(
                "{}, {}, {} - {}, {}",
                business.address, business.city, business.state, business.pincode,
                business.country
            ),
            business_gstin: business.gstin.clone(),
            business_pan: business.pan.clone(),
            business_phone: business.phone.clone(),
            business_email: business.email.clone(),
            business_website: business.website.clone(),
            bank_name: business.bank_name.clone(),
            bank_account_number: business.bank_account_number.clone(),
            bank_ifsc: business.bank_ifsc.clone(),
            bank_branch: business.bank_branch.clone(),

            order_code: snapshot.order_code.clone(),
            order_date: format_date(snapshot.order_date),
            payment_method: snapshot.payment_method.clone(),
            payment_status: snapshot.payment_status.clone(),

            customer_name: snapshot.customer.name.clone(),
            customer_email: snapshot.customer.email.clone(),
            customer_phone: snapshot.customer.phone.clone(),

            shipping_address: format_address(&snapshot.shipping_address),
            billing_address: format_address(&snapshot.billing_address),
            ships_to_different_recipient: snapshot.ships_to_different_recipient,
            receiver_name: snapshot.receiver_name.clone().unwrap_or_default(),
            receiver_phone: snapshot.receiver_phone.clone().unwrap_or_default(),

            items: snapshot
                .items
                .iter()
                .map(|item| TemplateLineItem {
                    name: item.name.clone(),
                    hsn_code: item.hsn_code.clone(),
                    quantity: item.quantity.to_string(),
                    unit: item.unit.clone(),
                    unit_price: format_money(item.unit_price),
                    discounted_unit_price: format_money(item.discounted_unit_price),
                    tax_rate: format_rate(item.tax_rate),
                    tax_amount: format_money(item.tax_amount),
                    line_total: format_money(item.line_total),
                })
                .collect(),

            subtotal: format_money(pricing.subtotal),
            product_discount: format_money(pricing.product_discount),
            coupon_discount: format_money(pricing.coupon_discount),
            shipping_fee: format_money(pricing.shipping_fee),
            taxable_amount: format_money(pricing.taxable_amount),
            cgst_rate: format_rate(pricing.cgst.rate),
            cgst_amount: format_money(pricing.cgst.amount),
            sgst_rate: format_rate(pricing.sgst.rate),
            sgst_amount: format_money(pricing.sgst.amount),
            igst_rate: format_rate(pricing.igst.rate),
            igst_amount: format_money(pricing.igst.amount),
            total_tax: format_money(pricing.total_tax),
            grand_total: format_money(pricing.grand_total),
            rounding_adjustment: format_money(pricing.rounding_adjustment),
            final_amount: format_money(pricing.final_amount),
            amount_in_words: pricing.amount_in_words.clone(),

            coupon_code: snapshot
                .coupon
                .as_ref()
                .map(|c| c.code.clone())
                .unwrap_or_default(),
            coupon_discount_type: snapshot
                .coupon
                .as_ref()
                .map(|c| c.discount_type.clone())
                .unwrap_or_default(),
        }
    }
}

fn format_money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn format_rate(rate: Decimal) -> String {
    format!("{}%", rate.normalize())
}

fn format_date(when: DateTime<Utc>) -> String {
    when.format("%d/%m/%Y").to_string()
}

fn format_address(address: &SnapshotAddress) -> String {
    let mut parts = vec![address.line1.clone()];
    if let Some(line2) = &address.line2 {
        if !line2.trim().is_empty() {
            parts.push(line2.clone());
        }
    }
    parts.push(address.city.clone());
    parts.push(format!("{} - {}", address.state, address.pincode));
    parts.push(address.country.clone());
    parts.join(", ")
}

/// HTTP adapter to the external document renderer.
#[derive(Clone)]
pub struct HttpRenderer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRenderer {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to build renderer client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl HttpRenderer {
    async fn post_render(&self, template: &InvoiceTemplate) -> Result<Vec<u8>, AppError> {
        let url = format!("{}/render/invoice", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(template)
            .send()
            .await
            .map_err(|e| AppError::Rendering(anyhow::anyhow!("Renderer request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Rendering(anyhow::anyhow!("Renderer returned an error: {}", e)))?;

        let bytes = response.bytes().await.map_err(|e| {
            AppError::Rendering(anyhow::anyhow!("Failed to read rendered document: {}", e))
        })?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl InvoiceRenderer for HttpRenderer {
    #[instrument(skip(self, template), fields(invoice_number = %template.invoice_number))]
    async fn render(&self, template: &InvoiceTemplate) -> Result<Vec<u8>, AppError> {
        let start = Instant::now();
        let result = self.post_render(template).await;

        let outcome = if result.is_ok() { "rendered" } else { "failed" };
        RENDER_DURATION
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        result
    }
}
