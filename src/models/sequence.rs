//! Per-year sequence counter model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One counter row per calendar year, created lazily on first allocation.
/// `sequence` is the last issued value and only ever increases, except for
/// the administrative reset.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SequenceCounter {
    pub year: i32,
    pub sequence: i64,
    pub updated_utc: DateTime<Utc>,
}
