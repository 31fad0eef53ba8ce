//! Quote item batch reconciliation.

use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::models::{ItemLookupRecord, ItemPayload, QuoteItemRecord};
use crate::store::BillingStore;

/// Reconciles a submitted item batch against a quote's stored items.
#[derive(Clone)]
pub struct ItemManager {
    store: Arc<dyn BillingStore>,
}

impl ItemManager {
    pub fn new(store: Arc<dyn BillingStore>) -> Self {
        Self { store }
    }

    /// Apply a submitted batch to `quote_id` and return the touched item ids.
    ///
    /// Blank-named rows are placeholders and get skipped. Rows carrying an
    /// id that does not belong to `quote_id` are skipped with a warning so
    /// the rest of the batch still lands. Catalog promotion is a side write;
    /// its failure never rolls back the item itself.
    #[instrument(skip(self, submitted), fields(quote_id = %quote_id, count = submitted.len()))]
    pub async fn reconcile(
        &self,
        quote_id: Uuid,
        submitted: &[ItemPayload],
    ) -> Result<Vec<Uuid>, AppError> {
        let mut touched = Vec::with_capacity(submitted.len());

        for (index, payload) in submitted.iter().enumerate() {
            if payload.name.trim().is_empty() {
                debug!(index = index, "Skipping placeholder item row");
                continue;
            }

            let record = to_record(quote_id, payload, index)?;

            let item_id = match payload.item_id {
                Some(item_id) => {
                    let owner = self
                        .store
                        .get_quote_item(item_id)
                        .await?
                        .map(|existing| existing.quote_id);
                    match owner {
                        Some(owner_id) if owner_id == quote_id => {
                            self.store.update_quote_item(item_id, &record).await?;
                            item_id
                        }
                        _ => {
                            warn!(
                                item_id = %item_id,
                                index = index,
                                "Submitted item does not belong to this quote, skipping"
                            );
                            continue;
                        }
                    }
                }
                None => {
                    let item_id = Uuid::new_v4();
                    self.store.insert_quote_item(item_id, &record).await?;
                    item_id
                }
            };

            if payload.save_item_as_lookup {
                let lookup = ItemLookupRecord {
                    name: record.name.clone(),
                    description: record.description.clone(),
                    price: record.price,
                };
                if let Err(e) = self.store.insert_item_lookup(&lookup).await {
                    warn!(item_id = %item_id, error = %e, "Failed to save item lookup");
                }
            }

            touched.push(item_id);
        }

        Ok(touched)
    }
}

fn to_record(
    quote_id: Uuid,
    payload: &ItemPayload,
    index: usize,
) -> Result<QuoteItemRecord, AppError> {
    let quantity = unformat_amount(&payload.quantity).ok_or_else(|| {
        AppError::validation(
            "items",
            format!("item {}: quantity '{}' is not a number", index, payload.quantity),
        )
    })?;
    let price = unformat_amount(&payload.price).ok_or_else(|| {
        AppError::validation(
            "items",
            format!("item {}: price '{}' is not a number", index, payload.price),
        )
    })?;

    Ok(QuoteItemRecord {
        quote_id,
        name: payload.name.trim().to_string(),
        description: payload.description.clone(),
        quantity,
        price,
        tax_rate_id: payload.tax_rate_id,
        display_order: payload.display_order,
    })
}

/// Parse a locale-formatted amount ("1,234.56", "1.234,56", "1,50") into a
/// decimal.
///
/// When both separators occur, the later one is the decimal point. A lone
/// comma is a thousands separator exactly when three digits follow it;
/// otherwise it is a decimal comma. A lone dot is always a decimal point
/// unless it repeats.
pub fn unformat_amount(raw: &str) -> Option<Decimal> {
    let s: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if s.is_empty() {
        return None;
    }

    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(d), Some(c)) => {
            let decimal_pos = d.max(c);
            s.char_indices()
                .filter_map(|(i, ch)| match ch {
                    '.' | ',' if i != decimal_pos => None,
                    '.' | ',' => Some('.'),
                    _ => Some(ch),
                })
                .collect()
        }
        (Some(_), None) => {
            if s.matches('.').count() > 1 {
                // "1.234.567" style grouping with no decimal part.
                s.replace('.', "")
            } else {
                s
            }
        }
        (None, Some(c)) => {
            let trailing_digits = s.len() - c - 1;
            if s.matches(',').count() == 1 && trailing_digits != 3 {
                s.replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (None, None) => s,
    };

    Decimal::from_str_exact(&normalized).ok()
}
