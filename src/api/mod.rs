//! Thin HTTP admin surface.
//!
//! Each handler validates its arguments and calls straight into
//! [`InvoicingService`]; no business logic lives here.

mod handlers;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

use crate::services::InvoicingService;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<InvoicingService>,
}

/// Build the admin router.
pub fn router(service: Arc<InvoicingService>) -> Router {
    Router::new()
        .route("/invoices", get(handlers::list_invoices))
        .route("/invoices/by-number/:number", get(handlers::get_by_number))
        .route(
            "/invoices/by-number/:number/download",
            get(handlers::download_by_number),
        )
        .route("/invoices/:order_ref", get(handlers::get_by_order))
        .route("/invoices/:order_ref/status", get(handlers::invoice_status))
        .route(
            "/invoices/:order_ref/download",
            get(handlers::download_by_order),
        )
        .route(
            "/invoices/:order_ref/generate",
            post(handlers::generate_invoice),
        )
        .with_state(ApiState { service })
}
