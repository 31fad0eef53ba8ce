//! Tax rate definition model for quoting-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tax rate definition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TaxRate {
    pub tax_rate_id: Uuid,
    pub name: String,
    /// Fractional rate, e.g. 0.10 for a 10% rate.
    pub rate: Decimal,
    pub created_utc: DateTime<Utc>,
}
