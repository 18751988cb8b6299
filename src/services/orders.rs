//! Order read model collaborator.
//!
//! Orders are owned by the commerce backend; invoice generation only ever
//! reads them. The production adapter fetches the invoice-facing read model
//! over HTTP.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::instrument;

use crate::error::AppError;
use crate::models::OrderRecord;

/// Read access to orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch an order by its stable reference. `None` when it does not
    /// exist.
    async fn fetch_order(&self, order_ref: &str) -> Result<Option<OrderRecord>, AppError>;
}

/// HTTP adapter to the commerce backend's internal order read endpoint.
#[derive(Clone)]
pub struct HttpOrderStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrderStore {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to build order client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl OrderStore for HttpOrderStore {
    #[instrument(skip(self), fields(order_ref = %order_ref))]
    async fn fetch_order(&self, order_ref: &str) -> Result<Option<OrderRecord>, AppError> {
        let url = format!("{}/internal/orders/{}", self.base_url, order_ref);

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Order service request failed: {}", e))
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response.error_for_status().map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Order service returned an error: {}", e))
        })?;

        let order = response.json::<OrderRecord>().await.map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to decode order payload: {}", e))
        })?;

        Ok(Some(order))
    }
}
