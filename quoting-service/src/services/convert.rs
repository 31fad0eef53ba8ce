//! Quote to invoice conversion.

use chrono::Duration;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::config::Settings;
use crate::models::{ConvertQuote, Invoice, InvoiceItem, InvoiceStatus, InvoiceTaxRate};
use crate::services::metrics::CONVERSIONS_TOTAL;
use crate::services::numbering::NumberGenerator;
use crate::services::quotes::generate_url_key;
use crate::store::BillingStore;

/// Converts a quote into a draft invoice.
///
/// Conversion is a structural copy: every item and tax association is
/// duplicated under new identities owned by the invoice, and the tax totals
/// carry the quote's already-computed snapshots rather than being
/// re-derived. The source quote is never touched.
pub struct ConversionEngine {
    store: Arc<dyn BillingStore>,
    numbering: NumberGenerator,
}

impl ConversionEngine {
    pub fn new(store: Arc<dyn BillingStore>) -> Self {
        Self {
            numbering: NumberGenerator::new(store.clone()),
            store,
        }
    }

    /// Convert `input.quote_id` into a new draft invoice and return its id.
    ///
    /// The aggregate lands in a single store transaction; a failure leaves
    /// no partial invoice behind.
    #[instrument(skip(self, input, settings), fields(quote_id = %input.quote_id))]
    pub async fn convert(
        &self,
        input: &ConvertQuote,
        settings: &Settings,
    ) -> Result<Uuid, AppError> {
        input.validate()?;

        let result = self.convert_inner(input, settings).await;

        let status = if result.is_ok() { "success" } else { "failure" };
        CONVERSIONS_TOTAL.with_label_values(&[status]).inc();

        result
    }

    async fn convert_inner(
        &self,
        input: &ConvertQuote,
        settings: &Settings,
    ) -> Result<Uuid, AppError> {
        let quote = self.store.get_quote(input.quote_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Quote {} not found", input.quote_id))
        })?;
        let items = self.store.list_quote_items(quote.quote_id).await?;
        let taxes = self.store.list_quote_taxes(quote.quote_id).await?;

        let number = self
            .numbering
            .next(input.invoice_group_id, input.created_at)
            .await?;

        let invoice_id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let invoice = Invoice {
            invoice_id,
            client_id: input.client_id,
            invoice_group_id: input.invoice_group_id,
            user_id: input.user_id,
            number,
            status: InvoiceStatus::Draft.as_str().to_string(),
            created_at: input.created_at,
            due_at: input.created_at + Duration::days(settings.invoices_due_after_days),
            url_key: generate_url_key(),
            created_utc: now,
        };

        let invoice_items: Vec<InvoiceItem> = items
            .iter()
            .map(|item| InvoiceItem {
                item_id: Uuid::new_v4(),
                invoice_id,
                name: item.name.clone(),
                description: item.description.clone(),
                quantity: item.quantity,
                price: item.price,
                tax_rate_id: item.tax_rate_id,
                display_order: item.display_order,
                created_utc: now,
            })
            .collect();

        let invoice_taxes: Vec<InvoiceTaxRate> = taxes
            .iter()
            .map(|tax| InvoiceTaxRate {
                invoice_tax_rate_id: Uuid::new_v4(),
                invoice_id,
                tax_rate_id: tax.tax_rate_id,
                include_item_tax: tax.include_item_tax,
                tax_total: tax.tax_total,
                created_utc: now,
            })
            .collect();

        self.store
            .insert_invoice_aggregate(&invoice, &invoice_items, &invoice_taxes)
            .await?;

        info!(
            quote_id = %quote.quote_id,
            invoice_id = %invoice_id,
            number = %invoice.number,
            "Quote converted to invoice"
        );

        Ok(invoice_id)
    }
}
