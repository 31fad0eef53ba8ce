//! Shared fixtures for quoting-service integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use quoting_service::config::Settings;
use quoting_service::models::{
    Client, CreateQuote, InvoiceGroup, ItemPayload, QuoteStatus, TaxRate, UpdateQuote, User,
};
use quoting_service::services::{Notifier, QuoteLifecycle, TracingNotifier};
use quoting_service::store::{BillingStore, InMemoryStore};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).expect("Invalid decimal literal")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("Invalid date literal")
}

/// Seeded in-memory store plus the fixture ids the tests need.
pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub settings: Settings,
    /// Quote numbering group, prefix "QUO-", left pad 4.
    pub quote_group_id: Uuid,
    /// Invoice numbering group, prefix "INV-", left pad 4.
    pub invoice_group_id: Uuid,
    /// 10% rate.
    pub rate_a: TaxRate,
    /// 5% rate.
    pub rate_b: TaxRate,
    pub user_id: Uuid,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());

        let quote_group_id = Uuid::new_v4();
        store
            .add_invoice_group(group(quote_group_id, "Quotes", "QUO-"))
            .expect("Failed to seed quote group");

        let invoice_group_id = Uuid::new_v4();
        store
            .add_invoice_group(group(invoice_group_id, "Invoices", "INV-"))
            .expect("Failed to seed invoice group");

        let rate_a = tax_rate("Standard 10%", "0.10");
        store
            .add_tax_rate(rate_a.clone())
            .expect("Failed to seed tax rate");
        let rate_b = tax_rate("Levy 5%", "0.05");
        store
            .add_tax_rate(rate_b.clone())
            .expect("Failed to seed tax rate");

        let settings = Settings {
            quote_footer: "Thank you for your business".to_string(),
            mail_driver: Some("smtp".to_string()),
            mail_from: Some("billing@example.com".to_string()),
            mail_cc_default: Some("records@example.com".to_string()),
            ..Settings::default()
        };

        Self {
            store,
            settings,
            quote_group_id,
            invoice_group_id,
            rate_a,
            rate_b,
            user_id: Uuid::new_v4(),
        }
    }

    pub fn store(&self) -> Arc<dyn BillingStore> {
        self.store.clone()
    }

    pub fn lifecycle(&self) -> QuoteLifecycle {
        self.lifecycle_with(Arc::new(TracingNotifier))
    }

    pub fn lifecycle_with(&self, notifier: Arc<dyn Notifier>) -> QuoteLifecycle {
        QuoteLifecycle::new(self.store(), notifier)
    }

    pub fn create_input(&self, client_name: &str) -> CreateQuote {
        CreateQuote {
            client_name: client_name.to_string(),
            invoice_group_id: self.quote_group_id,
            created_at: date(2026, 3, 1),
            user_id: self.user_id,
        }
    }

    /// Create a quote and return its id.
    pub async fn create_quote(&self, lifecycle: &QuoteLifecycle, client_name: &str) -> Uuid {
        lifecycle
            .create(&self.create_input(client_name), &self.settings)
            .await
            .expect("Failed to create quote")
    }

    /// Seed the fixture's quote owner with the given address.
    pub fn seed_user(&self, email: &str) -> User {
        let user = User {
            user_id: self.user_id,
            name: "Fixture User".to_string(),
            email: email.to_string(),
            created_utc: Utc::now(),
        };
        self.store
            .add_user(user.clone())
            .expect("Failed to seed user");
        user
    }

    pub fn seed_client(&self, name: &str, email: Option<&str>) -> Client {
        let client = Client {
            client_id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.map(|e| e.to_string()),
            created_utc: Utc::now(),
        };
        self.store
            .add_client(client.clone())
            .expect("Failed to seed client");
        client
    }
}

fn group(invoice_group_id: Uuid, name: &str, prefix: &str) -> InvoiceGroup {
    InvoiceGroup {
        invoice_group_id,
        name: name.to_string(),
        next_id: 1,
        left_pad: 4,
        prefix: prefix.to_string(),
        prefix_year: false,
        prefix_month: false,
        created_utc: Utc::now(),
    }
}

fn tax_rate(name: &str, rate: &str) -> TaxRate {
    TaxRate {
        tax_rate_id: Uuid::new_v4(),
        name: name.to_string(),
        rate: dec(rate),
        created_utc: Utc::now(),
    }
}

pub fn item_payload(name: &str, quantity: &str, price: &str) -> ItemPayload {
    ItemPayload {
        item_id: None,
        name: name.to_string(),
        description: format!("{} description", name),
        quantity: quantity.to_string(),
        price: price.to_string(),
        tax_rate_id: None,
        display_order: 0,
        save_item_as_lookup: false,
    }
}

/// Update input that keeps the quote's current header values.
pub async fn update_input_for(store: &dyn BillingStore, quote_id: Uuid) -> UpdateQuote {
    let quote = store
        .get_quote(quote_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");

    UpdateQuote {
        number: quote.number,
        created_at: quote.created_at,
        expires_at: quote.expires_at,
        status: QuoteStatus::from_string(&quote.status),
        footer: quote.footer,
        items: Vec::new(),
        custom_fields: HashMap::new(),
    }
}
