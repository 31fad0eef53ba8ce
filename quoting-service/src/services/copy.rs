//! Quote duplication.

use chrono::Duration;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::config::Settings;
use crate::models::{CopyQuote, Quote, QuoteItem, QuoteStatus, QuoteTaxRate};
use crate::services::metrics::QUOTES_TOTAL;
use crate::services::numbering::NumberGenerator;
use crate::services::quotes::generate_url_key;
use crate::store::BillingStore;

/// Duplicates a quote under a new client, date and invoice group.
pub struct CopyEngine {
    store: Arc<dyn BillingStore>,
    numbering: NumberGenerator,
}

impl CopyEngine {
    pub fn new(store: Arc<dyn BillingStore>) -> Self {
        Self {
            numbering: NumberGenerator::new(store.clone()),
            store,
        }
    }

    /// Deep-copy the source quote and return the duplicate's id.
    ///
    /// The duplicate starts over as a draft with a fresh number, url key and
    /// expiry date; items and tax associations are copied under new
    /// identities. The source quote is unaffected.
    #[instrument(skip(self, input, settings), fields(quote_id = %input.quote_id))]
    pub async fn copy(&self, input: &CopyQuote, settings: &Settings) -> Result<Uuid, AppError> {
        input.validate()?;

        let source = self.store.get_quote(input.quote_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Quote {} not found", input.quote_id))
        })?;
        let source_items = self.store.list_quote_items(source.quote_id).await?;
        let source_taxes = self.store.list_quote_taxes(source.quote_id).await?;

        let client_name = input.client_name.trim();
        let client = match self.store.find_client_by_name(client_name).await? {
            Some(client) => client,
            None => self.store.create_client(client_name).await?,
        };

        let number = self
            .numbering
            .next(input.invoice_group_id, input.created_at)
            .await?;

        let quote_id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let quote = Quote {
            quote_id,
            client_id: client.client_id,
            invoice_group_id: input.invoice_group_id,
            user_id: input.user_id,
            number,
            status: QuoteStatus::Draft.as_str().to_string(),
            created_at: input.created_at,
            expires_at: input.created_at + Duration::days(settings.quotes_expire_after_days),
            footer: source.footer.clone(),
            url_key: generate_url_key(),
            created_utc: now,
        };

        let items: Vec<QuoteItem> = source_items
            .iter()
            .map(|item| QuoteItem {
                item_id: Uuid::new_v4(),
                quote_id,
                name: item.name.clone(),
                description: item.description.clone(),
                quantity: item.quantity,
                price: item.price,
                tax_rate_id: item.tax_rate_id,
                display_order: item.display_order,
                created_utc: now,
            })
            .collect();

        // The item set is identical, so the source's tax total snapshots
        // stay valid on the duplicate.
        let taxes: Vec<QuoteTaxRate> = source_taxes
            .iter()
            .map(|tax| QuoteTaxRate {
                quote_tax_rate_id: Uuid::new_v4(),
                quote_id,
                tax_rate_id: tax.tax_rate_id,
                include_item_tax: tax.include_item_tax,
                tax_total: tax.tax_total,
                created_utc: now,
            })
            .collect();

        self.store
            .insert_quote_aggregate(&quote, &items, &taxes)
            .await?;

        QUOTES_TOTAL.with_label_values(&["copied"]).inc();

        info!(
            source_quote_id = %source.quote_id,
            quote_id = %quote_id,
            number = %quote.number,
            "Quote copied"
        );

        Ok(quote_id)
    }
}
