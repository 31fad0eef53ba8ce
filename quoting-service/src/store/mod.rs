//! Persistence ports for the quoting engine.
//!
//! All durable writes go through [`BillingStore`]. Two implementations are
//! provided: [`Database`] (Postgres, production) and [`InMemoryStore`]
//! (tests and local development).

use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{
    Client, Invoice, InvoiceGroup, InvoiceItem, InvoiceTaxRate, ItemLookup, ItemLookupRecord,
    Quote, QuoteItem, QuoteItemRecord, QuoteTaxRate, TaxRate, UpdateQuote, User,
};

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::Database;

/// Durable storage port for quote/invoice aggregates and their collaborators.
///
/// Multi-row operations (`insert_quote_aggregate`, `insert_invoice_aggregate`,
/// `update_quote`, `delete_quote`) are atomic: implementations apply every
/// row or none.
#[async_trait]
pub trait BillingStore: Send + Sync {
    // Invoice groups

    /// Atomically claim the group's current counter value, advancing it by
    /// one. Returns the group plus the claimed value, or `None` when the
    /// group is unknown. Serialized per group so concurrent callers never
    /// receive the same value.
    async fn allocate_group_counter(
        &self,
        group_id: Uuid,
    ) -> Result<Option<(InvoiceGroup, i64)>, AppError>;

    // Clients
    async fn find_client_by_name(&self, name: &str) -> Result<Option<Client>, AppError>;
    async fn create_client(&self, name: &str) -> Result<Client, AppError>;

    // Users
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    // Tax rate definitions
    async fn get_tax_rate(&self, tax_rate_id: Uuid) -> Result<Option<TaxRate>, AppError>;
    async fn get_tax_rates(&self, ids: &[Uuid]) -> Result<Vec<TaxRate>, AppError>;

    // Quotes
    async fn insert_quote_aggregate(
        &self,
        quote: &Quote,
        items: &[QuoteItem],
        taxes: &[QuoteTaxRate],
    ) -> Result<(), AppError>;
    async fn get_quote(&self, quote_id: Uuid) -> Result<Option<Quote>, AppError>;

    /// Update the quote header and replace its custom field values in one
    /// atomic write. Item reconciliation is a separate concern.
    async fn update_quote(&self, quote_id: Uuid, update: &UpdateQuote) -> Result<bool, AppError>;
    async fn delete_quote(&self, quote_id: Uuid) -> Result<bool, AppError>;
    async fn get_custom_fields(&self, quote_id: Uuid)
        -> Result<HashMap<String, String>, AppError>;

    // Quote items
    async fn insert_quote_item(
        &self,
        item_id: Uuid,
        record: &QuoteItemRecord,
    ) -> Result<(), AppError>;
    async fn update_quote_item(
        &self,
        item_id: Uuid,
        record: &QuoteItemRecord,
    ) -> Result<bool, AppError>;
    async fn get_quote_item(&self, item_id: Uuid) -> Result<Option<QuoteItem>, AppError>;
    async fn list_quote_items(&self, quote_id: Uuid) -> Result<Vec<QuoteItem>, AppError>;
    async fn delete_quote_item(&self, item_id: Uuid) -> Result<Option<QuoteItem>, AppError>;

    // Quote tax associations
    async fn insert_quote_tax(&self, tax: &QuoteTaxRate) -> Result<(), AppError>;
    async fn list_quote_taxes(&self, quote_id: Uuid) -> Result<Vec<QuoteTaxRate>, AppError>;
    async fn delete_quote_tax(
        &self,
        quote_tax_rate_id: Uuid,
    ) -> Result<Option<QuoteTaxRate>, AppError>;
    async fn set_quote_tax_totals(
        &self,
        quote_id: Uuid,
        totals: &[(Uuid, Decimal)],
    ) -> Result<(), AppError>;

    // Invoices
    async fn insert_invoice_aggregate(
        &self,
        invoice: &Invoice,
        items: &[InvoiceItem],
        taxes: &[InvoiceTaxRate],
    ) -> Result<(), AppError>;
    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError>;
    async fn list_invoice_items(&self, invoice_id: Uuid) -> Result<Vec<InvoiceItem>, AppError>;
    async fn list_invoice_taxes(&self, invoice_id: Uuid)
        -> Result<Vec<InvoiceTaxRate>, AppError>;

    // Item lookup catalog
    async fn insert_item_lookup(&self, record: &ItemLookupRecord) -> Result<ItemLookup, AppError>;
    async fn list_item_lookups(&self) -> Result<Vec<ItemLookup>, AppError>;
}
