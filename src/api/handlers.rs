//! Request handlers for the admin surface.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Invoice, InvoiceState, ListInvoicesFilter};
use crate::services::RenderedInvoice;

use super::ApiState;

#[derive(Debug, Deserialize)]
pub struct GenerateInvoiceRequest {
    pub generated_by: String,
    /// Target sequence year; defaults to the current calendar year.
    #[serde(default)]
    pub year: Option<i32>,
}

pub async fn generate_invoice(
    State(state): State<ApiState>,
    Path(order_ref): Path<String>,
    Json(request): Json<GenerateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), AppError> {
    if request.generated_by.trim().is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "generated_by must not be empty"
        )));
    }

    // The only place the wall clock decides the sequence year.
    let year = request
        .year
        .unwrap_or_else(|| chrono::Utc::now().year());

    let invoice = state
        .service
        .generate(&order_ref, request.generated_by.trim(), year)
        .await?;

    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn invoice_status(
    State(state): State<ApiState>,
    Path(order_ref): Path<String>,
) -> Result<Json<crate::models::InvoiceStatus>, AppError> {
    Ok(Json(state.service.status(&order_ref).await?))
}

pub async fn get_by_order(
    State(state): State<ApiState>,
    Path(order_ref): Path<String>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(state.service.get_by_order(&order_ref).await?))
}

pub async fn get_by_number(
    State(state): State<ApiState>,
    Path(number): Path<String>,
) -> Result<Json<Invoice>, AppError> {
    Ok(Json(state.service.get_by_number(&number).await?))
}

pub async fn download_by_order(
    State(state): State<ApiState>,
    Path(order_ref): Path<String>,
) -> Result<Response, AppError> {
    let rendered = state.service.download_by_order(&order_ref).await?;
    Ok(pdf_response(rendered))
}

pub async fn download_by_number(
    State(state): State<ApiState>,
    Path(number): Path<String>,
) -> Result<Response, AppError> {
    let rendered = state.service.download_by_number(&number).await?;
    Ok(pdf_response(rendered))
}

fn pdf_response(rendered: RenderedInvoice) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", rendered.filename()),
            ),
        ],
        rendered.bytes,
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    #[serde(default)]
    pub page_size: Option<i32>,
    #[serde(default)]
    pub page_token: Option<Uuid>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListInvoicesResponse {
    pub invoices: Vec<Invoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<Uuid>,
}

pub async fn list_invoices(
    State(state): State<ApiState>,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<ListInvoicesResponse>, AppError> {
    let state_filter = match query.state.as_deref() {
        None => None,
        Some("generated") => Some(InvoiceState::Generated),
        Some("downloaded") => Some(InvoiceState::Downloaded),
        Some("sent") => Some(InvoiceState::Sent),
        Some(other) => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Unknown invoice state: {}",
                other
            )))
        }
    };

    let page_size = query.page_size.unwrap_or(25).clamp(1, 100);
    let filter = ListInvoicesFilter {
        state: state_filter,
        page_size,
        page_token: query.page_token,
    };

    let invoices = state.service.list(&filter).await?;
    let next_page_token = if invoices.len() as i32 == page_size {
        invoices.last().map(|invoice| invoice.invoice_id)
    } else {
        None
    };

    Ok(Json(ListInvoicesResponse {
        invoices,
        next_page_token,
    }))
}
