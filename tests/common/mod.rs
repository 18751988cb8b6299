//! Test helpers for gst-invoicing integration tests.
//!
//! Provides in-memory doubles for the storage and collaborator seams so the
//! generation and download flows can be exercised hermetically.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::types::Json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use gst_invoicing::config::BusinessConfig;
use gst_invoicing::error::AppError;
use gst_invoicing::models::{
    Invoice, InvoiceState, ListInvoicesFilter, NewInvoice, OrderAddress, OrderCustomer, OrderLine,
    OrderRecord,
};
use gst_invoicing::services::{
    InvoiceRenderer, InvoiceStore, InvoiceTemplate, InvoicingService, OrderStore, SequenceStore,
};

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// In-memory invoice and sequence storage with the same uniqueness and
/// atomicity contracts as the Postgres implementation.
#[derive(Default)]
pub struct MemoryStore {
    invoices: Mutex<HashMap<String, Invoice>>,
    sequences: Mutex<HashMap<i32, i64>>,
}

#[async_trait]
impl SequenceStore for MemoryStore {
    async fn next_sequence(&self, year: i32) -> Result<i64, AppError> {
        let mut sequences = self.sequences.lock().unwrap();
        let counter = sequences.entry(year).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn current_sequence(&self, year: i32) -> Result<i64, AppError> {
        Ok(*self.sequences.lock().unwrap().get(&year).unwrap_or(&0))
    }

    async fn reset_sequence(&self, year: i32) -> Result<(), AppError> {
        self.sequences.lock().unwrap().insert(year, 0);
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn create_if_absent(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        let mut invoices = self.invoices.lock().unwrap();

        if invoices.contains_key(&input.order_ref)
            || invoices
                .values()
                .any(|inv| inv.invoice_number == input.invoice_number)
        {
            return Err(AppError::DuplicateInvoice(anyhow::anyhow!(
                "An invoice already exists for order {}",
                input.order_ref
            )));
        }

        let invoice = Invoice {
            invoice_id: Uuid::new_v4(),
            invoice_number: input.invoice_number.clone(),
            order_ref: input.order_ref.clone(),
            generated_at: Utc::now(),
            generated_by: input.generated_by.clone(),
            snapshot: Json(input.snapshot.clone()),
            state: InvoiceState::Generated.as_str().to_string(),
            download_count: 0,
            last_downloaded_at: None,
        };
        invoices.insert(input.order_ref.clone(), invoice.clone());
        Ok(invoice)
    }

    async fn get_by_order(&self, order_ref: &str) -> Result<Option<Invoice>, AppError> {
        Ok(self.invoices.lock().unwrap().get(order_ref).cloned())
    }

    async fn get_by_number(&self, invoice_number: &str) -> Result<Option<Invoice>, AppError> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .values()
            .find(|inv| inv.invoice_number == invoice_number)
            .cloned())
    }

    async fn list(&self, filter: &ListInvoicesFilter) -> Result<Vec<Invoice>, AppError> {
        let invoices = self.invoices.lock().unwrap();
        let mut all: Vec<Invoice> = invoices
            .values()
            .filter(|inv| {
                filter
                    .state
                    .map(|state| inv.state() == state)
                    .unwrap_or(true)
            })
            .filter(|inv| {
                filter
                    .page_token
                    .map(|cursor| inv.invoice_id > cursor)
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        all.sort_by_key(|inv| inv.invoice_id);
        all.truncate(filter.page_size.clamp(1, 100) as usize);
        Ok(all)
    }

    async fn record_download(&self, order_ref: &str) -> Result<Option<Invoice>, AppError> {
        let mut invoices = self.invoices.lock().unwrap();
        let Some(invoice) = invoices.get_mut(order_ref) else {
            return Ok(None);
        };
        invoice.download_count += 1;
        invoice.last_downloaded_at = Some(Utc::now());
        invoice.state = invoice.state().on_download().as_str().to_string();
        Ok(Some(invoice.clone()))
    }
}

/// Order store backed by a fixed map of orders.
#[derive(Default)]
pub struct StubOrderStore {
    orders: Mutex<HashMap<String, OrderRecord>>,
}

impl StubOrderStore {
    pub fn with_order(order: OrderRecord) -> Self {
        let store = Self::default();
        store.insert(order);
        store
    }

    pub fn insert(&self, order: OrderRecord) {
        self.orders
            .lock()
            .unwrap()
            .insert(order.order_ref.clone(), order);
    }
}

#[async_trait]
impl OrderStore for StubOrderStore {
    async fn fetch_order(&self, order_ref: &str) -> Result<Option<OrderRecord>, AppError> {
        Ok(self.orders.lock().unwrap().get(order_ref).cloned())
    }
}

/// Renderer double returning canned bytes, or failing on demand.
#[derive(Default)]
pub struct StubRenderer {
    pub fail: AtomicBool,
}

#[async_trait]
impl InvoiceRenderer for StubRenderer {
    async fn render(&self, template: &InvoiceTemplate) -> Result<Vec<u8>, AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Rendering(anyhow::anyhow!(
                "renderer unavailable"
            )));
        }
        Ok(format!("%PDF-1.4 {}", template.invoice_number).into_bytes())
    }
}

pub fn test_business_config() -> BusinessConfig {
    BusinessConfig {
        name: "Acme Retail Pvt Ltd".to_string(),
        address: "12 Industrial Estate".to_string(),
        city: "Pune".to_string(),
        state: "Maharashtra".to_string(),
        pincode: "411001".to_string(),
        country: "India".to_string(),
        gstin: "27AAACA1234A1Z5".to_string(),
        pan: "AAACA1234A".to_string(),
        phone: "+91 20 1234 5678".to_string(),
        email: "billing@acme.example".to_string(),
        website: "https://acme.example".to_string(),
        bank_name: "State Bank".to_string(),
        bank_account_number: "123456789012".to_string(),
        bank_ifsc: "SBIN0000123".to_string(),
        bank_branch: "Pune Main".to_string(),
        default_gst_rate: d("18"),
    }
}

pub fn test_address(state: &str) -> OrderAddress {
    OrderAddress {
        line1: "42 MG Road".to_string(),
        line2: None,
        city: "Pune".to_string(),
        state: state.to_string(),
        pincode: "411002".to_string(),
        country: "India".to_string(),
    }
}

/// The fixed pricing scenario used across tests: subtotal 1000, shipping 50,
/// two 18% lines with totals 600 and 450.
pub fn test_order(order_ref: &str, destination_state: &str) -> OrderRecord {
    OrderRecord {
        order_ref: order_ref.to_string(),
        order_code: format!("ORD-{}", order_ref),
        created_at: Utc::now(),
        status: "confirmed".to_string(),
        payment_method: "upi".to_string(),
        payment_status: "paid".to_string(),
        customer: OrderCustomer {
            name: "Asha Patel".to_string(),
            email: "asha@example.com".to_string(),
            phone: "+91 98765 43210".to_string(),
        },
        lines: vec![
            OrderLine {
                product_name: "Steel Bottle".to_string(),
                hsn_code: "7323".to_string(),
                quantity: 2,
                unit: "pcs".to_string(),
                unit_price: d("300"),
                discounted_price: None,
                gst_rate: Some(d("18")),
            },
            OrderLine {
                product_name: "Cotton Towel".to_string(),
                hsn_code: "6302".to_string(),
                quantity: 3,
                unit: "pcs".to_string(),
                unit_price: d("150"),
                discounted_price: None,
                gst_rate: Some(d("18")),
            },
        ],
        shipping_address: test_address(destination_state),
        billing_address: None,
        receiver: None,
        coupon: None,
        subtotal: d("1000"),
        product_discount: d("0"),
        coupon_discount: d("0"),
        shipping_fee: d("50"),
    }
}

/// Fully wired service over the in-memory doubles.
pub struct TestHarness {
    pub service: Arc<InvoicingService>,
    pub store: Arc<MemoryStore>,
    pub orders: Arc<StubOrderStore>,
    pub renderer: Arc<StubRenderer>,
}

impl TestHarness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let orders = Arc::new(StubOrderStore::default());
        let renderer = Arc::new(StubRenderer::default());
        let service = Arc::new(InvoicingService::new(
            store.clone(),
            store.clone(),
            orders.clone(),
            renderer.clone(),
            test_business_config(),
        ));
        Self {
            service,
            store,
            orders,
            renderer,
        }
    }
}
