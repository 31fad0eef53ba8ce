//! In-memory implementation of the billing store.
//!
//! Intended for tests and local development. A single mutex guards the whole
//! state, which also makes every multi-row operation trivially atomic.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{
    Client, Invoice, InvoiceGroup, InvoiceItem, InvoiceTaxRate, ItemLookup, ItemLookupRecord,
    Quote, QuoteItem, QuoteItemRecord, QuoteTaxRate, TaxRate, UpdateQuote, User,
};

use super::BillingStore;

#[derive(Default)]
struct State {
    invoice_groups: HashMap<Uuid, InvoiceGroup>,
    clients: HashMap<Uuid, Client>,
    users: HashMap<Uuid, User>,
    tax_rates: HashMap<Uuid, TaxRate>,
    quotes: HashMap<Uuid, Quote>,
    quote_items: HashMap<Uuid, QuoteItem>,
    quote_taxes: HashMap<Uuid, QuoteTaxRate>,
    custom_fields: HashMap<Uuid, HashMap<String, String>>,
    invoices: HashMap<Uuid, Invoice>,
    invoice_items: HashMap<Uuid, InvoiceItem>,
    invoice_taxes: HashMap<Uuid, InvoiceTaxRate>,
    item_lookups: Vec<ItemLookup>,
}

/// In-memory billing store.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::InternalError(anyhow!("store lock poisoned")))
    }

    /// Seed an invoice group.
    pub fn add_invoice_group(&self, group: InvoiceGroup) -> Result<(), AppError> {
        let mut state = self.lock()?;
        state.invoice_groups.insert(group.invoice_group_id, group);
        Ok(())
    }

    /// Seed a tax rate definition.
    pub fn add_tax_rate(&self, rate: TaxRate) -> Result<(), AppError> {
        let mut state = self.lock()?;
        state.tax_rates.insert(rate.tax_rate_id, rate);
        Ok(())
    }

    /// Seed a client.
    pub fn add_client(&self, client: Client) -> Result<(), AppError> {
        let mut state = self.lock()?;
        state.clients.insert(client.client_id, client);
        Ok(())
    }

    /// Seed a user.
    pub fn add_user(&self, user: User) -> Result<(), AppError> {
        let mut state = self.lock()?;
        state.users.insert(user.user_id, user);
        Ok(())
    }

    /// Counts of stored invoices, invoice items and invoice tax rows.
    pub fn invoice_row_counts(&self) -> Result<(usize, usize, usize), AppError> {
        let state = self.lock()?;
        Ok((
            state.invoices.len(),
            state.invoice_items.len(),
            state.invoice_taxes.len(),
        ))
    }
}

fn sorted_quote_items(state: &State, quote_id: Uuid) -> Vec<QuoteItem> {
    let mut items: Vec<QuoteItem> = state
        .quote_items
        .values()
        .filter(|i| i.quote_id == quote_id)
        .cloned()
        .collect();
    items.sort_by_key(|i| (i.display_order, i.created_utc));
    items
}

#[async_trait]
impl BillingStore for InMemoryStore {
    async fn allocate_group_counter(
        &self,
        group_id: Uuid,
    ) -> Result<Option<(InvoiceGroup, i64)>, AppError> {
        let mut state = self.lock()?;
        match state.invoice_groups.get_mut(&group_id) {
            Some(group) => {
                let counter = group.next_id;
                group.next_id += 1;
                Ok(Some((group.clone(), counter)))
            }
            None => Ok(None),
        }
    }

    async fn find_client_by_name(&self, name: &str) -> Result<Option<Client>, AppError> {
        let state = self.lock()?;
        Ok(state.clients.values().find(|c| c.name == name).cloned())
    }

    async fn create_client(&self, name: &str) -> Result<Client, AppError> {
        let mut state = self.lock()?;
        let client = Client {
            client_id: Uuid::new_v4(),
            name: name.to_string(),
            email: None,
            created_utc: Utc::now(),
        };
        state.clients.insert(client.client_id, client.clone());
        Ok(client)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let state = self.lock()?;
        Ok(state.users.get(&user_id).cloned())
    }

    async fn get_tax_rate(&self, tax_rate_id: Uuid) -> Result<Option<TaxRate>, AppError> {
        let state = self.lock()?;
        Ok(state.tax_rates.get(&tax_rate_id).cloned())
    }

    async fn get_tax_rates(&self, ids: &[Uuid]) -> Result<Vec<TaxRate>, AppError> {
        let state = self.lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.tax_rates.get(id).cloned())
            .collect())
    }

    async fn insert_quote_aggregate(
        &self,
        quote: &Quote,
        items: &[QuoteItem],
        taxes: &[QuoteTaxRate],
    ) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if state
            .quotes
            .values()
            .any(|q| q.invoice_group_id == quote.invoice_group_id && q.number == quote.number)
        {
            return Err(AppError::DuplicateNumber(anyhow!(
                "quote number '{}' already exists in its invoice group",
                quote.number
            )));
        }
        state.quotes.insert(quote.quote_id, quote.clone());
        for item in items {
            state.quote_items.insert(item.item_id, item.clone());
        }
        for tax in taxes {
            state.quote_taxes.insert(tax.quote_tax_rate_id, tax.clone());
        }
        Ok(())
    }

    async fn get_quote(&self, quote_id: Uuid) -> Result<Option<Quote>, AppError> {
        let state = self.lock()?;
        Ok(state.quotes.get(&quote_id).cloned())
    }

    async fn update_quote(&self, quote_id: Uuid, update: &UpdateQuote) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let Some(group_id) = state.quotes.get(&quote_id).map(|q| q.invoice_group_id) else {
            return Ok(false);
        };
        // Same per-group uniqueness the schema enforces with its constraint.
        if state.quotes.values().any(|q| {
            q.quote_id != quote_id
                && q.invoice_group_id == group_id
                && q.number == update.number
        }) {
            return Err(AppError::DuplicateNumber(anyhow!(
                "quote number '{}' already exists in its invoice group",
                update.number
            )));
        }
        let Some(quote) = state.quotes.get_mut(&quote_id) else {
            return Ok(false);
        };
        quote.number = update.number.clone();
        quote.created_at = update.created_at;
        quote.expires_at = update.expires_at;
        quote.status = update.status.as_str().to_string();
        quote.footer = update.footer.clone();
        state
            .custom_fields
            .insert(quote_id, update.custom_fields.clone());
        Ok(true)
    }

    async fn delete_quote(&self, quote_id: Uuid) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        if state.quotes.remove(&quote_id).is_none() {
            return Ok(false);
        }
        state.quote_items.retain(|_, i| i.quote_id != quote_id);
        state.quote_taxes.retain(|_, t| t.quote_id != quote_id);
        state.custom_fields.remove(&quote_id);
        Ok(true)
    }

    async fn get_custom_fields(
        &self,
        quote_id: Uuid,
    ) -> Result<HashMap<String, String>, AppError> {
        let state = self.lock()?;
        Ok(state.custom_fields.get(&quote_id).cloned().unwrap_or_default())
    }

    async fn insert_quote_item(
        &self,
        item_id: Uuid,
        record: &QuoteItemRecord,
    ) -> Result<(), AppError> {
        let mut state = self.lock()?;
        let item = QuoteItem {
            item_id,
            quote_id: record.quote_id,
            name: record.name.clone(),
            description: record.description.clone(),
            quantity: record.quantity,
            price: record.price,
            tax_rate_id: record.tax_rate_id,
            display_order: record.display_order,
            created_utc: Utc::now(),
        };
        state.quote_items.insert(item_id, item);
        Ok(())
    }

    async fn update_quote_item(
        &self,
        item_id: Uuid,
        record: &QuoteItemRecord,
    ) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let Some(item) = state.quote_items.get_mut(&item_id) else {
            return Ok(false);
        };
        item.name = record.name.clone();
        item.description = record.description.clone();
        item.quantity = record.quantity;
        item.price = record.price;
        item.tax_rate_id = record.tax_rate_id;
        item.display_order = record.display_order;
        Ok(true)
    }

    async fn get_quote_item(&self, item_id: Uuid) -> Result<Option<QuoteItem>, AppError> {
        let state = self.lock()?;
        Ok(state.quote_items.get(&item_id).cloned())
    }

    async fn list_quote_items(&self, quote_id: Uuid) -> Result<Vec<QuoteItem>, AppError> {
        let state = self.lock()?;
        Ok(sorted_quote_items(&state, quote_id))
    }

    async fn delete_quote_item(&self, item_id: Uuid) -> Result<Option<QuoteItem>, AppError> {
        let mut state = self.lock()?;
        Ok(state.quote_items.remove(&item_id))
    }

    async fn insert_quote_tax(&self, tax: &QuoteTaxRate) -> Result<(), AppError> {
        let mut state = self.lock()?;
        state.quote_taxes.insert(tax.quote_tax_rate_id, tax.clone());
        Ok(())
    }

    async fn list_quote_taxes(&self, quote_id: Uuid) -> Result<Vec<QuoteTaxRate>, AppError> {
        let state = self.lock()?;
        let mut taxes: Vec<QuoteTaxRate> = state
            .quote_taxes
            .values()
            .filter(|t| t.quote_id == quote_id)
            .cloned()
            .collect();
        taxes.sort_by_key(|t| t.created_utc);
        Ok(taxes)
    }

    async fn delete_quote_tax(
        &self,
        quote_tax_rate_id: Uuid,
    ) -> Result<Option<QuoteTaxRate>, AppError> {
        let mut state = self.lock()?;
        Ok(state.quote_taxes.remove(&quote_tax_rate_id))
    }

    async fn set_quote_tax_totals(
        &self,
        quote_id: Uuid,
        totals: &[(Uuid, Decimal)],
    ) -> Result<(), AppError> {
        let mut state = self.lock()?;
        for (quote_tax_rate_id, total) in totals {
            if let Some(tax) = state.quote_taxes.get_mut(quote_tax_rate_id) {
                if tax.quote_id == quote_id {
                    tax.tax_total = *total;
                }
            }
        }
        Ok(())
    }

    async fn insert_invoice_aggregate(
        &self,
        invoice: &Invoice,
        items: &[InvoiceItem],
        taxes: &[InvoiceTaxRate],
    ) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if state.invoices.values().any(|i| {
            i.invoice_group_id == invoice.invoice_group_id && i.number == invoice.number
        }) {
            return Err(AppError::DuplicateNumber(anyhow!(
                "invoice number '{}' already exists in its invoice group",
                invoice.number
            )));
        }
        state.invoices.insert(invoice.invoice_id, invoice.clone());
        for item in items {
            state.invoice_items.insert(item.item_id, item.clone());
        }
        for tax in taxes {
            state
                .invoice_taxes
                .insert(tax.invoice_tax_rate_id, tax.clone());
        }
        Ok(())
    }

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let state = self.lock()?;
        Ok(state.invoices.get(&invoice_id).cloned())
    }

    async fn list_invoice_items(&self, invoice_id: Uuid) -> Result<Vec<InvoiceItem>, AppError> {
        let state = self.lock()?;
        let mut items: Vec<InvoiceItem> = state
            .invoice_items
            .values()
            .filter(|i| i.invoice_id == invoice_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.display_order, i.created_utc));
        Ok(items)
    }

    async fn list_invoice_taxes(
        &self,
        invoice_id: Uuid,
    ) -> Result<Vec<InvoiceTaxRate>, AppError> {
        let state = self.lock()?;
        let mut taxes: Vec<InvoiceTaxRate> = state
            .invoice_taxes
            .values()
            .filter(|t| t.invoice_id == invoice_id)
            .cloned()
            .collect();
        taxes.sort_by_key(|t| t.created_utc);
        Ok(taxes)
    }

    async fn insert_item_lookup(
        &self,
        record: &ItemLookupRecord,
    ) -> Result<ItemLookup, AppError> {
        let mut state = self.lock()?;
        let lookup = ItemLookup {
            item_lookup_id: Uuid::new_v4(),
            name: record.name.clone(),
            description: record.description.clone(),
            price: record.price,
            created_utc: Utc::now(),
        };
        state.item_lookups.push(lookup.clone());
        Ok(lookup)
    }

    async fn list_item_lookups(&self) -> Result<Vec<ItemLookup>, AppError> {
        let state = self.lock()?;
        Ok(state.item_lookups.clone())
    }
}
