//! Invoice group model for quoting-service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Named numbering sequence that quotes and invoices are issued under.
///
/// `next_id` is the counter for the next document number; formatting combines
/// the prefix, optional year/month segments and the zero-padded counter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceGroup {
    pub invoice_group_id: Uuid,
    pub name: String,
    pub next_id: i64,
    pub left_pad: i32,
    pub prefix: String,
    pub prefix_year: bool,
    pub prefix_month: bool,
    pub created_utc: DateTime<Utc>,
}
