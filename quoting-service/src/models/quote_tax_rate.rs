//! Quote tax rate association model for quoting-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Link between a quote and a tax rate definition.
///
/// `include_item_tax` controls compounding: when set, the already-computed
/// item-level tax is folded into the base before this rate applies.
/// `tax_total` is a computed snapshot, refreshed whenever the quote's items
/// or associations change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuoteTaxRate {
    pub quote_tax_rate_id: Uuid,
    pub quote_id: Uuid,
    pub tax_rate_id: Uuid,
    pub include_item_tax: bool,
    pub tax_total: Decimal,
    pub created_utc: DateTime<Utc>,
}
