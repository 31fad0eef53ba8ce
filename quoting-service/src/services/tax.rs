//! Tax total computation for quote tax rate associations.

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{QuoteItem, QuoteTaxRate, TaxRate};

/// Computes per-association tax totals for a quote.
///
/// Pure and deterministic. Intermediate values stay unrounded; only the
/// final per-association total is rounded to currency precision (2 dp,
/// half-up).
pub struct TaxRateCalculator;

impl TaxRateCalculator {
    /// Compute the tax total snapshot for each association.
    ///
    /// The base for every association is the sum of all item subtotals, not
    /// just items referencing the association's rate. When
    /// `include_item_tax` is set, the already-computed item-level tax is
    /// folded into the base before the association rate applies.
    pub fn compute(
        items: &[QuoteItem],
        associations: &[QuoteTaxRate],
        rates: &[TaxRate],
    ) -> Vec<(Uuid, Decimal)> {
        let rate_by_id: HashMap<Uuid, Decimal> =
            rates.iter().map(|r| (r.tax_rate_id, r.rate)).collect();

        let item_subtotal: Decimal = items.iter().map(|i| i.quantity * i.price).sum();
        let item_tax: Decimal = items
            .iter()
            .map(|i| {
                let rate = i
                    .tax_rate_id
                    .and_then(|id| rate_by_id.get(&id).copied())
                    .unwrap_or(Decimal::ZERO);
                i.quantity * i.price * rate
            })
            .sum();

        associations
            .iter()
            .map(|assoc| {
                let rate = rate_by_id
                    .get(&assoc.tax_rate_id)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                let base = if assoc.include_item_tax {
                    item_subtotal + item_tax
                } else {
                    item_subtotal
                };
                let total = (base * rate)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                (assoc.quote_tax_rate_id, total)
            })
            .collect()
    }
}
