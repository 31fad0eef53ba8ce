//! Quote aggregate lifecycle: create, update, delete and the tax/item
//! maintenance operations around it.

use chrono::Duration;
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::config::Settings;
use crate::models::{CreateQuote, ItemPayload, Quote, QuoteStatus, QuoteTaxRate, UpdateQuote};
use crate::services::items::{unformat_amount, ItemManager};
use crate::services::metrics::QUOTES_TOTAL;
use crate::services::notify::Notifier;
use crate::services::numbering::NumberGenerator;
use crate::services::tax::TaxRateCalculator;
use crate::store::BillingStore;

/// Quote lifecycle engine.
pub struct QuoteLifecycle {
    store: Arc<dyn BillingStore>,
    numbering: NumberGenerator,
    items: ItemManager,
    notifier: Arc<dyn Notifier>,
}

impl QuoteLifecycle {
    pub fn new(store: Arc<dyn BillingStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            numbering: NumberGenerator::new(store.clone()),
            items: ItemManager::new(store.clone()),
            store,
            notifier,
        }
    }

    /// Create a quote with no items or tax associations.
    ///
    /// The client is resolved by name, created on the fly when unknown. The
    /// expiry date and default footer come from `settings`.
    #[instrument(skip(self, input, settings), fields(group_id = %input.invoice_group_id))]
    pub async fn create(
        &self,
        input: &CreateQuote,
        settings: &Settings,
    ) -> Result<Uuid, AppError> {
        input.validate()?;

        let client_name = input.client_name.trim();
        let client = match self.store.find_client_by_name(client_name).await? {
            Some(client) => client,
            None => self.store.create_client(client_name).await?,
        };

        let number = self
            .numbering
            .next(input.invoice_group_id, input.created_at)
            .await?;

        let quote = Quote {
            quote_id: Uuid::new_v4(),
            client_id: client.client_id,
            invoice_group_id: input.invoice_group_id,
            user_id: input.user_id,
            number,
            status: QuoteStatus::Draft.as_str().to_string(),
            created_at: input.created_at,
            expires_at: input.created_at + Duration::days(settings.quotes_expire_after_days),
            footer: settings.quote_footer.clone(),
            url_key: generate_url_key(),
            created_utc: chrono::Utc::now(),
        };

        self.store.insert_quote_aggregate(&quote, &[], &[]).await?;

        QUOTES_TOTAL.with_label_values(&["created"]).inc();

        info!(quote_id = %quote.quote_id, number = %quote.number, "Quote created");

        Ok(quote.quote_id)
    }

    /// Update the quote header, replace custom fields, reconcile the item
    /// batch and refresh tax snapshots.
    ///
    /// Header and item validation happens up front; nothing is written when
    /// any of it fails.
    #[instrument(skip(self, input), fields(quote_id = %quote_id))]
    pub async fn update(
        &self,
        quote_id: Uuid,
        input: &UpdateQuote,
    ) -> Result<Vec<Uuid>, AppError> {
        input.validate()?;
        validate_items(&input.items)?;

        if !self.store.update_quote(quote_id, input).await? {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Quote {} not found",
                quote_id
            )));
        }

        let touched = self.items.reconcile(quote_id, &input.items).await?;
        self.recalculate_taxes(quote_id).await?;

        self.notifier.quote_modified(quote_id).await;

        QUOTES_TOTAL.with_label_values(&["updated"]).inc();

        Ok(touched)
    }

    /// Delete a quote together with its items, tax associations and custom
    /// fields.
    #[instrument(skip(self), fields(quote_id = %quote_id))]
    pub async fn delete(&self, quote_id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_quote(quote_id).await? {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Quote {} not found",
                quote_id
            )));
        }

        QUOTES_TOTAL.with_label_values(&["deleted"]).inc();

        Ok(())
    }

    /// Attach a tax rate to a quote and refresh snapshots.
    #[instrument(skip(self), fields(quote_id = %quote_id, tax_rate_id = %tax_rate_id))]
    pub async fn add_tax(
        &self,
        quote_id: Uuid,
        tax_rate_id: Uuid,
        include_item_tax: bool,
    ) -> Result<Uuid, AppError> {
        self.store.get_quote(quote_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Quote {} not found", quote_id))
        })?;
        self.store.get_tax_rate(tax_rate_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Tax rate {} not found", tax_rate_id))
        })?;

        let association = QuoteTaxRate {
            quote_tax_rate_id: Uuid::new_v4(),
            quote_id,
            tax_rate_id,
            include_item_tax,
            tax_total: Decimal::ZERO,
            created_utc: chrono::Utc::now(),
        };
        self.store.insert_quote_tax(&association).await?;

        self.recalculate_taxes(quote_id).await?;

        Ok(association.quote_tax_rate_id)
    }

    /// Detach a tax rate association and refresh the remaining snapshots.
    #[instrument(skip(self), fields(quote_tax_rate_id = %quote_tax_rate_id))]
    pub async fn remove_tax(&self, quote_tax_rate_id: Uuid) -> Result<(), AppError> {
        let removed = self
            .store
            .delete_quote_tax(quote_tax_rate_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!(
                    "Quote tax rate {} not found",
                    quote_tax_rate_id
                ))
            })?;

        self.recalculate_taxes(removed.quote_id).await
    }

    /// Remove a single item and refresh snapshots.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), AppError> {
        let removed = self
            .store
            .delete_quote_item(item_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Quote item {} not found", item_id))
            })?;

        self.recalculate_taxes(removed.quote_id).await
    }

    /// Recompute every tax total snapshot on the quote from its current
    /// items and associations.
    pub async fn recalculate_taxes(&self, quote_id: Uuid) -> Result<(), AppError> {
        let items = self.store.list_quote_items(quote_id).await?;
        let associations = self.store.list_quote_taxes(quote_id).await?;
        if associations.is_empty() {
            return Ok(());
        }

        let mut rate_ids: Vec<Uuid> = associations.iter().map(|a| a.tax_rate_id).collect();
        rate_ids.extend(items.iter().filter_map(|i| i.tax_rate_id));
        rate_ids.sort_unstable();
        rate_ids.dedup();

        let rates = self.store.get_tax_rates(&rate_ids).await?;
        let totals = TaxRateCalculator::compute(&items, &associations, &rates);

        self.store.set_quote_tax_totals(quote_id, &totals).await
    }
}

/// Validate the full item batch before any write. Blank-named placeholder
/// rows are exempt.
fn validate_items(items: &[ItemPayload]) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();

    for (index, item) in items.iter().enumerate() {
        if item.name.trim().is_empty() {
            continue;
        }
        if unformat_amount(&item.quantity).is_none() {
            let mut error = ValidationError::new("quantity");
            error.message =
                Some(format!("item {}: quantity '{}' is not a number", index, item.quantity).into());
            errors.add("items", error);
        }
        if unformat_amount(&item.price).is_none() {
            let mut error = ValidationError::new("price");
            error.message =
                Some(format!("item {}: price '{}' is not a number", index, item.price).into());
            errors.add("items", error);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Random 32-character alphanumeric public-access token.
pub fn generate_url_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}
