//! Reusable item lookup catalog models for quoting-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Catalog entry promoted from a quote item for reuse on later documents.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ItemLookup {
    pub item_lookup_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a catalog entry.
#[derive(Debug, Clone)]
pub struct ItemLookupRecord {
    pub name: String,
    pub description: String,
    pub price: Decimal,
}
