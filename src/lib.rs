//! Invoice generation and numbering with frozen GST tax snapshots.
//!
//! The service allocates globally unique, gap-tolerant invoice numbers from
//! per-year counters, freezes a point-in-time financial snapshot of each
//! order (prices, discounts, CGST/SGST/IGST split, amount in words), and
//! enforces at most one invoice per order through storage-level uniqueness.
//! Documents are rendered on demand from the frozen snapshot by an external
//! renderer and never stored.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;
pub mod startup;
