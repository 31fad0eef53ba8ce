//! Quote line item model for quoting-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Line item on a quote. Never shared across quotes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuoteItem {
    pub item_id: Uuid,
    pub quote_id: Uuid,
    pub name: String,
    pub description: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub tax_rate_id: Option<Uuid>,
    /// Presentation order. Not required to be unique.
    pub display_order: i32,
    pub created_utc: DateTime<Utc>,
}

/// One submitted row of a quote's item batch.
///
/// Quantity and price arrive in the locale-formatted text form the editing
/// UI produces ("1,234.56" or "1.234,56") and are unformatted before storage.
/// A blank name marks a placeholder row and is skipped, not rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPayload {
    pub item_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub quantity: String,
    pub price: String,
    pub tax_rate_id: Option<Uuid>,
    pub display_order: i32,
    /// When set, the item is also promoted into the reusable lookup catalog.
    pub save_item_as_lookup: bool,
}

/// Canonical item fields written by reconciliation.
#[derive(Debug, Clone)]
pub struct QuoteItemRecord {
    pub quote_id: Uuid,
    pub name: String,
    pub description: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub tax_rate_id: Option<Uuid>,
    pub display_order: i32,
}
