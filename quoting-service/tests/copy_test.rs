//! Quote duplication integration tests.

mod common;

use common::{date, item_payload, update_input_for, TestContext};
use quoting_service::models::{CopyQuote, QuoteStatus};
use quoting_service::services::CopyEngine;
use quoting_service::store::BillingStore;
use rust_decimal::Decimal;
use service_core::error::AppError;
use uuid::Uuid;

async fn seeded_quote(ctx: &TestContext) -> Uuid {
    let lifecycle = ctx.lifecycle();
    let quote_id = ctx.create_quote(&lifecycle, "Acme Corp").await;

    let mut first = item_payload("Design", "8", "120.00");
    first.tax_rate_id = Some(ctx.rate_a.tax_rate_id);
    let mut second = item_payload("Build", "40", "95.00");
    second.display_order = 1;
    let mut third = item_payload("Deploy", "4", "150.00");
    third.display_order = 2;

    let mut input = update_input_for(ctx.store.as_ref(), quote_id).await;
    input.status = QuoteStatus::Sent;
    input.items = vec![first, second, third];
    lifecycle
        .update(quote_id, &input)
        .await
        .expect("Failed to update quote");
    lifecycle
        .add_tax(quote_id, ctx.rate_a.tax_rate_id, false)
        .await
        .expect("Failed to add tax");

    quote_id
}

fn copy_input(ctx: &TestContext, quote_id: Uuid, client_name: &str) -> CopyQuote {
    CopyQuote {
        quote_id,
        client_name: client_name.to_string(),
        invoice_group_id: ctx.quote_group_id,
        created_at: date(2026, 5, 1),
        user_id: ctx.user_id,
    }
}

#[tokio::test]
async fn copy_duplicates_items_with_new_identities() {
    let ctx = TestContext::new();
    let source_id = seeded_quote(&ctx).await;

    let engine = CopyEngine::new(ctx.store());
    let copy_id = engine
        .copy(&copy_input(&ctx, source_id, "Globex"), &ctx.settings)
        .await
        .expect("Failed to copy");

    assert_ne!(copy_id, source_id);

    let source_items = ctx
        .store
        .list_quote_items(source_id)
        .await
        .expect("Failed to list items");
    let copy_items = ctx
        .store
        .list_quote_items(copy_id)
        .await
        .expect("Failed to list items");

    assert_eq!(copy_items.len(), 3);
    for (s, c) in source_items.iter().zip(copy_items.iter()) {
        assert_ne!(s.item_id, c.item_id);
        assert_eq!(s.name, c.name);
        assert_eq!(s.quantity, c.quantity);
        assert_eq!(s.price, c.price);
        assert_eq!(s.tax_rate_id, c.tax_rate_id);
        assert_eq!(s.display_order, c.display_order);
    }

    let subtotal = |items: &[quoting_service::models::QuoteItem]| -> Decimal {
        items.iter().map(|i| i.quantity * i.price).sum()
    };
    assert_eq!(subtotal(&source_items), subtotal(&copy_items));
}

#[tokio::test]
async fn copy_starts_over_as_draft_with_fresh_number_and_key() {
    let ctx = TestContext::new();
    let source_id = seeded_quote(&ctx).await;
    let source = ctx
        .store
        .get_quote(source_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");

    let engine = CopyEngine::new(ctx.store());
    let copy_id = engine
        .copy(&copy_input(&ctx, source_id, "Globex"), &ctx.settings)
        .await
        .expect("Failed to copy");

    let copy = ctx
        .store
        .get_quote(copy_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");

    assert_eq!(copy.status, QuoteStatus::Draft.as_str());
    assert_ne!(copy.number, source.number);
    assert_ne!(copy.url_key, source.url_key);
    assert_eq!(copy.created_at, date(2026, 5, 1));
    assert_eq!(copy.footer, source.footer);
}

#[tokio::test]
async fn copy_resolves_new_client_and_keeps_tax_snapshots() {
    let ctx = TestContext::new();
    let source_id = seeded_quote(&ctx).await;

    let engine = CopyEngine::new(ctx.store());
    let copy_id = engine
        .copy(&copy_input(&ctx, source_id, "Globex"), &ctx.settings)
        .await
        .expect("Failed to copy");

    let copy = ctx
        .store
        .get_quote(copy_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");
    let client = ctx
        .store
        .find_client_by_name("Globex")
        .await
        .expect("Failed to find client")
        .expect("Client was not created");
    assert_eq!(copy.client_id, client.client_id);

    let source_taxes = ctx
        .store
        .list_quote_taxes(source_id)
        .await
        .expect("Failed to list taxes");
    let copy_taxes = ctx
        .store
        .list_quote_taxes(copy_id)
        .await
        .expect("Failed to list taxes");
    assert_eq!(copy_taxes.len(), source_taxes.len());
    assert_eq!(copy_taxes[0].tax_total, source_taxes[0].tax_total);
    assert_ne!(
        copy_taxes[0].quote_tax_rate_id,
        source_taxes[0].quote_tax_rate_id
    );
}

#[tokio::test]
async fn copy_leaves_source_unaffected() {
    let ctx = TestContext::new();
    let source_id = seeded_quote(&ctx).await;
    let before = ctx
        .store
        .get_quote(source_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");

    let engine = CopyEngine::new(ctx.store());
    engine
        .copy(&copy_input(&ctx, source_id, "Globex"), &ctx.settings)
        .await
        .expect("Failed to copy");

    let after = ctx
        .store
        .get_quote(source_id)
        .await
        .expect("Failed to load quote")
        .expect("Quote missing");
    assert_eq!(before.number, after.number);
    assert_eq!(before.status, after.status);
    assert_eq!(
        ctx.store
            .list_quote_items(source_id)
            .await
            .expect("Failed to list items")
            .len(),
        3
    );
}

#[tokio::test]
async fn copy_missing_quote_returns_not_found() {
    let ctx = TestContext::new();
    let engine = CopyEngine::new(ctx.store());

    let result = engine
        .copy(&copy_input(&ctx, Uuid::new_v4(), "Globex"), &ctx.settings)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}
