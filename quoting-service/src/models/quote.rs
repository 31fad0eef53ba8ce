//! Quote model for quoting-service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use super::ItemPayload;

/// Quote status. Newly created quotes always start at `Draft`; the engine
/// treats later transitions as freely settable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Draft,
    Sent,
    Viewed,
    Approved,
    Rejected,
    Canceled,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "draft",
            QuoteStatus::Sent => "sent",
            QuoteStatus::Viewed => "viewed",
            QuoteStatus::Approved => "approved",
            QuoteStatus::Rejected => "rejected",
            QuoteStatus::Canceled => "canceled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "sent" => QuoteStatus::Sent,
            "viewed" => QuoteStatus::Viewed,
            "approved" => QuoteStatus::Approved,
            "rejected" => QuoteStatus::Rejected,
            "canceled" => QuoteStatus::Canceled,
            _ => QuoteStatus::Draft,
        }
    }
}

/// Quote document. Owns its items and tax rate associations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quote {
    pub quote_id: Uuid,
    pub client_id: Uuid,
    pub invoice_group_id: Uuid,
    pub user_id: Uuid,
    pub number: String,
    pub status: String,
    pub created_at: NaiveDate,
    pub expires_at: NaiveDate,
    pub footer: String,
    /// Opaque public-access token for client-facing views.
    pub url_key: String,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating a quote.
#[derive(Debug, Clone, Validate)]
pub struct CreateQuote {
    #[validate(length(min = 1, message = "client name is required"))]
    pub client_name: String,
    pub invoice_group_id: Uuid,
    pub created_at: NaiveDate,
    pub user_id: Uuid,
}

/// Input for updating a quote: header fields, the full item batch and the
/// replacement set of custom field values.
#[derive(Debug, Clone, Validate)]
pub struct UpdateQuote {
    #[validate(length(min = 1, message = "number is required"))]
    pub number: String,
    pub created_at: NaiveDate,
    pub expires_at: NaiveDate,
    pub status: QuoteStatus,
    pub footer: String,
    pub items: Vec<ItemPayload>,
    pub custom_fields: HashMap<String, String>,
}

/// Input for duplicating a quote under a new client, date and invoice group.
#[derive(Debug, Clone, Validate)]
pub struct CopyQuote {
    pub quote_id: Uuid,
    #[validate(length(min = 1, message = "client name is required"))]
    pub client_name: String,
    pub invoice_group_id: Uuid,
    pub created_at: NaiveDate,
    pub user_id: Uuid,
}

/// Input for mailing a quote.
#[derive(Debug, Clone, Validate)]
pub struct MailQuote {
    pub quote_id: Uuid,
    #[validate(email(message = "recipient must be a valid email address"))]
    pub to: String,
    #[validate(length(min = 1, message = "subject is required"))]
    pub subject: String,
    pub body: String,
}
