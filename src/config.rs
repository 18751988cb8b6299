//! Service configuration.
//!
//! Loaded from an optional `configuration` file plus `APP__`-prefixed
//! environment variables (`APP__DATABASE__URL`, `APP__BUSINESS__GSTIN`, ...).

use config::{Config as Cfg, File};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::BusinessProfile;

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Endpoints of the external collaborators: the commerce backend that owns
/// orders, and the document renderer.
#[derive(Debug, Deserialize, Clone)]
pub struct CollaboratorConfig {
    pub order_service_url: String,
    pub renderer_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Seller registration details frozen into every snapshot, plus the default
/// GST rate applied to lines that carry none.
#[derive(Debug, Deserialize, Clone)]
pub struct BusinessConfig {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
    pub gstin: String,
    pub pan: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub bank_account_number: String,
    #[serde(default)]
    pub bank_ifsc: String,
    #[serde(default)]
    pub bank_branch: String,
    #[serde(default = "default_gst_rate")]
    pub default_gst_rate: Decimal,
}

impl BusinessConfig {
    /// Copy of the profile as embedded in a snapshot.
    pub fn to_profile(&self) -> BusinessProfile {
        BusinessProfile {
            name: self.name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            pincode: self.pincode.clone(),
            country: self.country.clone(),
            gstin: self.gstin.clone(),
            pan: self.pan.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            website: self.website.clone(),
            bank_name: self.bank_name.clone(),
            bank_account_number: self.bank_account_number.clone(),
            bank_ifsc: self.bank_ifsc.clone(),
            bank_branch: self.bank_branch.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct InvoicingConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub collaborators: CollaboratorConfig,
    pub business: BusinessConfig,
}

impl InvoicingConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

fn default_service_name() -> String {
    "gst-invoicing".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_country() -> String {
    "India".to_string()
}

fn default_gst_rate() -> Decimal {
    Decimal::from(18)
}
