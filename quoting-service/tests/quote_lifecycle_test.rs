//! Quote lifecycle integration tests.

mod common;

use chrono::Duration;
use common::{date, dec, item_payload, update_input_for, TestContext};
use quoting_service::models::QuoteStatus;
use quoting_service::services::RecordingNotifier;
use quoting_service::store::BillingStore;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn create_quote_populates_header_from_settings() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();

    let quote_id = ctx.create_quote(&lifecycle, "Acme Corp").await;

    let quote = ctx
        .store
        .get_quote(quote_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");

    assert_eq!(quote.number, "QUO-0001");
    assert_eq!(quote.status, QuoteStatus::Draft.as_str());
    assert_eq!(quote.created_at, date(2026, 3, 1));
    assert_eq!(
        quote.expires_at,
        date(2026, 3, 1) + Duration::days(ctx.settings.quotes_expire_after_days)
    );
    assert_eq!(quote.footer, ctx.settings.quote_footer);
    assert_eq!(quote.url_key.len(), 32);
    assert!(quote.url_key.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[tokio::test]
async fn create_quote_resolves_existing_client_by_name() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();
    let client = ctx.seed_client("Acme Corp", Some("ap@acme.example"));

    let quote_id = ctx.create_quote(&lifecycle, "Acme Corp").await;

    let quote = ctx
        .store
        .get_quote(quote_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");
    assert_eq!(quote.client_id, client.client_id);
}

#[tokio::test]
async fn create_quote_creates_unknown_client() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();

    let quote_id = ctx.create_quote(&lifecycle, "Brand New Client").await;

    let quote = ctx
        .store
        .get_quote(quote_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");
    let client = ctx
        .store
        .find_client_by_name("Brand New Client")
        .await
        .expect("Failed to find client")
        .expect("Client was not created");
    assert_eq!(quote.client_id, client.client_id);
}

#[tokio::test]
async fn create_quote_rejects_blank_client_name() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();

    let mut input = ctx.create_input("");
    input.client_name = String::new();

    let result = lifecycle.create(&input, &ctx.settings).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn create_quote_with_unknown_group_fails() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();

    let mut input = ctx.create_input("Acme Corp");
    input.invoice_group_id = Uuid::new_v4();

    let result = lifecycle.create(&input, &ctx.settings).await;
    assert!(matches!(result, Err(AppError::InvalidGroup(_))));
}

#[tokio::test]
async fn update_quote_changes_header_and_custom_fields() {
    let ctx = TestContext::new();
    let notifier = Arc::new(RecordingNotifier::new());
    let lifecycle = ctx.lifecycle_with(notifier.clone());
    let quote_id = ctx.create_quote(&lifecycle, "Acme Corp").await;

    let mut input = update_input_for(ctx.store.as_ref(), quote_id).await;
    input.status = QuoteStatus::Sent;
    input.footer = "Updated footer".to_string();
    input.custom_fields = HashMap::from([("po_number".to_string(), "PO-77".to_string())]);
    input.items = vec![item_payload("Widget", "2", "5.00")];

    let touched = lifecycle
        .update(quote_id, &input)
        .await
        .expect("Failed to update quote");
    assert_eq!(touched.len(), 1);

    let quote = ctx
        .store
        .get_quote(quote_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");
    assert_eq!(quote.status, QuoteStatus::Sent.as_str());
    assert_eq!(quote.footer, "Updated footer");

    let fields = ctx
        .store
        .get_custom_fields(quote_id)
        .await
        .expect("Failed to load custom fields");
    assert_eq!(fields.get("po_number"), Some(&"PO-77".to_string()));

    assert_eq!(notifier.modified_quotes(), vec![quote_id]);
}

#[tokio::test]
async fn update_with_invalid_item_writes_nothing() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();
    let quote_id = ctx.create_quote(&lifecycle, "Acme Corp").await;

    let mut input = update_input_for(ctx.store.as_ref(), quote_id).await;
    input.footer = "Should not land".to_string();
    input.items = vec![
        item_payload("Widget", "2", "5.00"),
        item_payload("Broken", "not-a-number", "1.00"),
    ];

    let result = lifecycle.update(quote_id, &input).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let quote = ctx
        .store
        .get_quote(quote_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");
    assert_ne!(quote.footer, "Should not land");

    let items = ctx
        .store
        .list_quote_items(quote_id)
        .await
        .expect("Failed to list items");
    assert!(items.is_empty());
}

#[tokio::test]
async fn update_missing_quote_returns_not_found() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();
    let quote_id = ctx.create_quote(&lifecycle, "Acme Corp").await;

    let mut input = update_input_for(ctx.store.as_ref(), quote_id).await;
    input.number = "QUO-9999".to_string();

    let result = lifecycle.update(Uuid::new_v4(), &input).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn update_to_an_occupied_number_is_rejected() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();
    let first_id = ctx.create_quote(&lifecycle, "Acme Corp").await;
    let second_id = ctx.create_quote(&lifecycle, "Globex").await;

    let first = ctx
        .store
        .get_quote(first_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");

    let mut input = update_input_for(ctx.store.as_ref(), second_id).await;
    input.number = first.number;

    let result = lifecycle.update(second_id, &input).await;
    assert!(matches!(result, Err(AppError::DuplicateNumber(_))));

    let second = ctx
        .store
        .get_quote(second_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");
    assert_eq!(second.number, "QUO-0002");
}

#[tokio::test]
async fn delete_quote_cascades_items_and_taxes() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();
    let quote_id = ctx.create_quote(&lifecycle, "Acme Corp").await;

    let mut input = update_input_for(ctx.store.as_ref(), quote_id).await;
    input.items = vec![item_payload("Widget", "2", "5.00")];
    lifecycle
        .update(quote_id, &input)
        .await
        .expect("Failed to update quote");
    lifecycle
        .add_tax(quote_id, ctx.rate_a.tax_rate_id, false)
        .await
        .expect("Failed to add tax");

    lifecycle.delete(quote_id).await.expect("Failed to delete");

    assert!(ctx
        .store
        .get_quote(quote_id)
        .await
        .expect("Failed to load quote")
        .is_none());
    assert!(ctx
        .store
        .list_quote_items(quote_id)
        .await
        .expect("Failed to list items")
        .is_empty());
    assert!(ctx
        .store
        .list_quote_taxes(quote_id)
        .await
        .expect("Failed to list taxes")
        .is_empty());
}

#[tokio::test]
async fn delete_missing_quote_returns_not_found() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();

    let result = lifecycle.delete(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn add_tax_computes_snapshot() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();
    let quote_id = ctx.create_quote(&lifecycle, "Acme Corp").await;

    let mut input = update_input_for(ctx.store.as_ref(), quote_id).await;
    input.items = vec![item_payload("Widget", "2", "10.00")];
    lifecycle
        .update(quote_id, &input)
        .await
        .expect("Failed to update quote");

    lifecycle
        .add_tax(quote_id, ctx.rate_a.tax_rate_id, false)
        .await
        .expect("Failed to add tax");

    let taxes = ctx
        .store
        .list_quote_taxes(quote_id)
        .await
        .expect("Failed to list taxes");
    assert_eq!(taxes.len(), 1);
    assert_eq!(taxes[0].tax_total, dec("2.00"));
}

#[tokio::test]
async fn add_tax_with_unknown_rate_fails() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();
    let quote_id = ctx.create_quote(&lifecycle, "Acme Corp").await;

    let result = lifecycle.add_tax(quote_id, Uuid::new_v4(), false).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn remove_tax_refreshes_remaining_snapshots() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();
    let quote_id = ctx.create_quote(&lifecycle, "Acme Corp").await;

    let mut input = update_input_for(ctx.store.as_ref(), quote_id).await;
    input.items = vec![item_payload("Widget", "2", "10.00")];
    lifecycle
        .update(quote_id, &input)
        .await
        .expect("Failed to update quote");

    let tax_a = lifecycle
        .add_tax(quote_id, ctx.rate_a.tax_rate_id, false)
        .await
        .expect("Failed to add tax");
    lifecycle
        .add_tax(quote_id, ctx.rate_b.tax_rate_id, false)
        .await
        .expect("Failed to add tax");

    lifecycle.remove_tax(tax_a).await.expect("Failed to remove");

    let taxes = ctx
        .store
        .list_quote_taxes(quote_id)
        .await
        .expect("Failed to list taxes");
    assert_eq!(taxes.len(), 1);
    assert_eq!(taxes[0].tax_rate_id, ctx.rate_b.tax_rate_id);
    assert_eq!(taxes[0].tax_total, dec("1.00"));
}

#[tokio::test]
async fn delete_item_refreshes_snapshots() {
    let ctx = TestContext::new();
    let lifecycle = ctx.lifecycle();
    let quote_id = ctx.create_quote(&lifecycle, "Acme Corp").await;

    let mut input = update_input_for(ctx.store.as_ref(), quote_id).await;
    input.items = vec![
        item_payload("Widget", "2", "10.00"),
        item_payload("Gadget", "1", "30.00"),
    ];
    let touched = lifecycle
        .update(quote_id, &input)
        .await
        .expect("Failed to update quote");
    lifecycle
        .add_tax(quote_id, ctx.rate_a.tax_rate_id, false)
        .await
        .expect("Failed to add tax");

    lifecycle
        .delete_item(touched[1])
        .await
        .expect("Failed to delete item");

    let items = ctx
        .store
        .list_quote_items(quote_id)
        .await
        .expect("Failed to list items");
    assert_eq!(items.len(), 1);

    let taxes = ctx
        .store
        .list_quote_taxes(quote_id)
        .await
        .expect("Failed to list taxes");
    assert_eq!(taxes[0].tax_total, dec("2.00"));
}
