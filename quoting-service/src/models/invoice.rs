//! Invoice models for quoting-service.
//!
//! Invoices structurally mirror the quote aggregate but are independently
//! owned: conversion creates them and nothing ever mutates them to track the
//! source quote afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Invoice status. Conversion always produces a `Draft` invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Viewed,
    Paid,
    Overdue,
    Canceled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Viewed => "viewed",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Canceled => "canceled",
        }
    }
}

/// Invoice document created by converting a quote.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub client_id: Uuid,
    pub invoice_group_id: Uuid,
    pub user_id: Uuid,
    pub number: String,
    pub status: String,
    pub created_at: NaiveDate,
    pub due_at: NaiveDate,
    pub url_key: String,
    pub created_utc: DateTime<Utc>,
}

/// Line item on an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceItem {
    pub item_id: Uuid,
    pub invoice_id: Uuid,
    pub name: String,
    pub description: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub tax_rate_id: Option<Uuid>,
    pub display_order: i32,
    pub created_utc: DateTime<Utc>,
}

/// Tax rate association carried over from the source quote.
///
/// `tax_total` is the quote's already-computed snapshot; conversion is a
/// structural copy, not a re-derivation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvoiceTaxRate {
    pub invoice_tax_rate_id: Uuid,
    pub invoice_id: Uuid,
    pub tax_rate_id: Uuid,
    pub include_item_tax: bool,
    pub tax_total: Decimal,
    pub created_utc: DateTime<Utc>,
}

/// Input for converting a quote into an invoice.
#[derive(Debug, Clone, Validate)]
pub struct ConvertQuote {
    pub quote_id: Uuid,
    pub client_id: Uuid,
    pub invoice_group_id: Uuid,
    pub created_at: NaiveDate,
    pub user_id: Uuid,
}
