//! Sequential document numbering per invoice group.

use chrono::{Datelike, NaiveDate};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::InvoiceGroup;
use crate::store::BillingStore;

/// Allocates formatted document numbers from an invoice group's counter.
///
/// The counter claim is a single atomic store operation, so concurrent
/// callers on the same group always receive distinct, increasing values.
#[derive(Clone)]
pub struct NumberGenerator {
    store: Arc<dyn BillingStore>,
}

impl NumberGenerator {
    pub fn new(store: Arc<dyn BillingStore>) -> Self {
        Self { store }
    }

    /// Claim the next counter value for `group_id` and format it as a
    /// document number. `as_of` drives the optional year/month segments.
    #[instrument(skip(self), fields(group_id = %group_id))]
    pub async fn next(&self, group_id: Uuid, as_of: NaiveDate) -> Result<String, AppError> {
        let (group, counter) = self
            .store
            .allocate_group_counter(group_id)
            .await?
            .ok_or_else(|| {
                AppError::InvalidGroup(anyhow::anyhow!("Invoice group {} not found", group_id))
            })?;

        let number = format_number(&group, counter, as_of);

        info!(group = %group.name, number = %number, "Document number allocated");

        Ok(number)
    }
}

/// Combine the group's prefix, optional year/month segments and the
/// zero-padded counter into a document number.
fn format_number(group: &InvoiceGroup, counter: i64, as_of: NaiveDate) -> String {
    let mut number = group.prefix.clone();
    if group.prefix_year {
        number.push_str(&as_of.year().to_string());
    }
    if group.prefix_month {
        number.push_str(&format!("{:02}", as_of.month()));
    }
    let width = group.left_pad.max(0) as usize;
    number.push_str(&format!("{:0width$}", counter));
    number
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn group(prefix: &str, year: bool, month: bool, left_pad: i32) -> InvoiceGroup {
        InvoiceGroup {
            invoice_group_id: Uuid::new_v4(),
            name: "Quotes".to_string(),
            next_id: 1,
            left_pad,
            prefix: prefix.to_string(),
            prefix_year: year,
            prefix_month: month,
            created_utc: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pads_counter_to_width() {
        let g = group("QUO-", false, false, 6);
        assert_eq!(format_number(&g, 42, date(2026, 3, 9)), "QUO-000042");
    }

    #[test]
    fn year_and_month_segments() {
        let g = group("Q", true, true, 4);
        assert_eq!(format_number(&g, 7, date(2026, 3, 9)), "Q2026030007");
    }

    #[test]
    fn no_padding_when_left_pad_zero() {
        let g = group("", false, false, 0);
        assert_eq!(format_number(&g, 15, date(2026, 1, 1)), "15");
    }

    #[test]
    fn counter_wider_than_pad_is_not_truncated() {
        let g = group("INV", false, false, 3);
        assert_eq!(format_number(&g, 12345, date(2026, 1, 1)), "INV12345");
    }
}
