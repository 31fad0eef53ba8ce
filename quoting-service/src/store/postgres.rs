//! Postgres implementation of the billing store.

use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::models::{
    Client, Invoice, InvoiceGroup, InvoiceItem, InvoiceTaxRate, ItemLookup, ItemLookupRecord,
    Quote, QuoteItem, QuoteItemRecord, QuoteTaxRate, TaxRate, UpdateQuote, User,
};
use crate::services::metrics::{DB_QUERY_DURATION, ERRORS_TOTAL};

use super::BillingStore;

const QUOTE_COLUMNS: &str = "quote_id, client_id, invoice_group_id, user_id, number, status, \
     created_at, expires_at, footer, url_key, created_utc";

const INVOICE_COLUMNS: &str = "invoice_id, client_id, invoice_group_id, user_id, number, status, \
     created_at, due_at, url_key, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "quoting-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

fn db_err(context: &str, e: sqlx::Error) -> AppError {
    ERRORS_TOTAL.with_label_values(&["database"]).inc();
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

fn number_err(kind: &str, number: &str, e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            ERRORS_TOTAL.with_label_values(&["duplicate_number"]).inc();
            AppError::DuplicateNumber(anyhow::anyhow!(
                "{} number '{}' already exists in its invoice group",
                kind,
                number
            ))
        }
        _ => db_err("Failed to insert document", e),
    }
}

#[async_trait]
impl BillingStore for Database {
    #[instrument(skip(self), fields(group_id = %group_id))]
    async fn allocate_group_counter(
        &self,
        group_id: Uuid,
    ) -> Result<Option<(InvoiceGroup, i64)>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["allocate_group_counter"])
            .start_timer();

        // The single UPDATE..RETURNING keeps concurrent allocations serialized
        // by the row lock, so two callers never claim the same counter.
        let group = sqlx::query_as::<_, InvoiceGroup>(
            r#"
            UPDATE invoice_groups
            SET next_id = next_id + 1
            WHERE invoice_group_id = $1
            RETURNING invoice_group_id, name, next_id, left_pad, prefix, prefix_year, prefix_month, created_utc
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to allocate group counter", e))?;

        timer.observe_duration();

        Ok(group.map(|g| {
            let claimed = g.next_id - 1;
            (g, claimed)
        }))
    }

    #[instrument(skip(self, name))]
    async fn find_client_by_name(&self, name: &str) -> Result<Option<Client>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_client_by_name"])
            .start_timer();

        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT client_id, name, email, created_utc
            FROM clients
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to find client", e))?;

        timer.observe_duration();

        Ok(client)
    }

    #[instrument(skip(self, name))]
    async fn create_client(&self, name: &str) -> Result<Client, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_client"])
            .start_timer();

        let client = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (client_id, name)
            VALUES ($1, $2)
            RETURNING client_id, name, email, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to create client", e))?;

        timer.observe_duration();

        info!(client_id = %client.client_id, "Client created");

        Ok(client)
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_user"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, created_utc
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to get user", e))?;

        timer.observe_duration();

        Ok(user)
    }

    #[instrument(skip(self), fields(tax_rate_id = %tax_rate_id))]
    async fn get_tax_rate(&self, tax_rate_id: Uuid) -> Result<Option<TaxRate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_tax_rate"])
            .start_timer();

        let tax_rate = sqlx::query_as::<_, TaxRate>(
            r#"
            SELECT tax_rate_id, name, rate, created_utc
            FROM tax_rates
            WHERE tax_rate_id = $1
            "#,
        )
        .bind(tax_rate_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to get tax rate", e))?;

        timer.observe_duration();

        Ok(tax_rate)
    }

    #[instrument(skip(self, ids))]
    async fn get_tax_rates(&self, ids: &[Uuid]) -> Result<Vec<TaxRate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_tax_rates"])
            .start_timer();

        let tax_rates = sqlx::query_as::<_, TaxRate>(
            r#"
            SELECT tax_rate_id, name, rate, created_utc
            FROM tax_rates
            WHERE tax_rate_id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to get tax rates", e))?;

        timer.observe_duration();

        Ok(tax_rates)
    }

    #[instrument(skip(self, quote, items, taxes), fields(quote_id = %quote.quote_id))]
    async fn insert_quote_aggregate(
        &self,
        quote: &Quote,
        items: &[QuoteItem],
        taxes: &[QuoteTaxRate],
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_quote_aggregate"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("Failed to begin transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO quotes (
                quote_id, client_id, invoice_group_id, user_id, number, status,
                created_at, expires_at, footer, url_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(quote.quote_id)
        .bind(quote.client_id)
        .bind(quote.invoice_group_id)
        .bind(quote.user_id)
        .bind(&quote.number)
        .bind(&quote.status)
        .bind(quote.created_at)
        .bind(quote.expires_at)
        .bind(&quote.footer)
        .bind(&quote.url_key)
        .execute(&mut *tx)
        .await
        .map_err(|e| number_err("quote", &quote.number, e))?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO quote_items (
                    item_id, quote_id, name, description, quantity, price, tax_rate_id, display_order
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.item_id)
            .bind(item.quote_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.tax_rate_id)
            .bind(item.display_order)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("Failed to insert quote item", e))?;
        }

        for tax in taxes {
            sqlx::query(
                r#"
                INSERT INTO quote_tax_rates (
                    quote_tax_rate_id, quote_id, tax_rate_id, include_item_tax, tax_total
                )
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(tax.quote_tax_rate_id)
            .bind(tax.quote_id)
            .bind(tax.tax_rate_id)
            .bind(tax.include_item_tax)
            .bind(tax.tax_total)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("Failed to insert quote tax rate", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit quote", e))?;

        timer.observe_duration();

        info!(quote_id = %quote.quote_id, number = %quote.number, "Quote created");

        Ok(())
    }

    #[instrument(skip(self), fields(quote_id = %quote_id))]
    async fn get_quote(&self, quote_id: Uuid) -> Result<Option<Quote>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_quote"])
            .start_timer();

        let quote = sqlx::query_as::<_, Quote>(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quotes WHERE quote_id = $1"
        ))
        .bind(quote_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to get quote", e))?;

        timer.observe_duration();

        Ok(quote)
    }

    #[instrument(skip(self, update), fields(quote_id = %quote_id))]
    async fn update_quote(&self, quote_id: Uuid, update: &UpdateQuote) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_quote"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("Failed to begin transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE quotes
            SET number = $2,
                created_at = $3,
                expires_at = $4,
                status = $5,
                footer = $6
            WHERE quote_id = $1
            "#,
        )
        .bind(quote_id)
        .bind(&update.number)
        .bind(update.created_at)
        .bind(update.expires_at)
        .bind(update.status.as_str())
        .bind(&update.footer)
        .execute(&mut *tx)
        .await
        .map_err(|e| number_err("quote", &update.number, e))?;

        if result.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| db_err("Failed to roll back", e))?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM quote_custom_fields WHERE quote_id = $1")
            .bind(quote_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("Failed to clear custom fields", e))?;

        for (field, value) in &update.custom_fields {
            sqlx::query(
                r#"
                INSERT INTO quote_custom_fields (quote_id, field, value)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(quote_id)
            .bind(field)
            .bind(value)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("Failed to save custom field", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit quote update", e))?;

        timer.observe_duration();

        info!(quote_id = %quote_id, "Quote updated");

        Ok(true)
    }

    #[instrument(skip(self), fields(quote_id = %quote_id))]
    async fn delete_quote(&self, quote_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_quote"])
            .start_timer();

        // Items, tax associations and custom fields cascade at the schema level.
        let result = sqlx::query("DELETE FROM quotes WHERE quote_id = $1")
            .bind(quote_id)
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("Failed to delete quote", e))?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(quote_id = %quote_id, "Quote deleted");
        }

        Ok(deleted)
    }

    #[instrument(skip(self), fields(quote_id = %quote_id))]
    async fn get_custom_fields(
        &self,
        quote_id: Uuid,
    ) -> Result<HashMap<String, String>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_custom_fields"])
            .start_timer();

        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT field, value
            FROM quote_custom_fields
            WHERE quote_id = $1
            "#,
        )
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to get custom fields", e))?;

        timer.observe_duration();

        Ok(rows.into_iter().collect())
    }

    #[instrument(skip(self, record), fields(quote_id = %record.quote_id))]
    async fn insert_quote_item(
        &self,
        item_id: Uuid,
        record: &QuoteItemRecord,
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_quote_item"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO quote_items (
                item_id, quote_id, name, description, quantity, price, tax_rate_id, display_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item_id)
        .bind(record.quote_id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(record.quantity)
        .bind(record.price)
        .bind(record.tax_rate_id)
        .bind(record.display_order)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to insert quote item", e))?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self, record), fields(item_id = %item_id))]
    async fn update_quote_item(
        &self,
        item_id: Uuid,
        record: &QuoteItemRecord,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_quote_item"])
            .start_timer();

        let result = sqlx::query(
            r#"
            UPDATE quote_items
            SET name = $2,
                description = $3,
                quantity = $4,
                price = $5,
                tax_rate_id = $6,
                display_order = $7
            WHERE item_id = $1
            "#,
        )
        .bind(item_id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(record.quantity)
        .bind(record.price)
        .bind(record.tax_rate_id)
        .bind(record.display_order)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to update quote item", e))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn get_quote_item(&self, item_id: Uuid) -> Result<Option<QuoteItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_quote_item"])
            .start_timer();

        let item = sqlx::query_as::<_, QuoteItem>(
            r#"
            SELECT item_id, quote_id, name, description, quantity, price, tax_rate_id, display_order, created_utc
            FROM quote_items
            WHERE item_id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to get quote item", e))?;

        timer.observe_duration();

        Ok(item)
    }

    #[instrument(skip(self), fields(quote_id = %quote_id))]
    async fn list_quote_items(&self, quote_id: Uuid) -> Result<Vec<QuoteItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_quote_items"])
            .start_timer();

        let items = sqlx::query_as::<_, QuoteItem>(
            r#"
            SELECT item_id, quote_id, name, description, quantity, price, tax_rate_id, display_order, created_utc
            FROM quote_items
            WHERE quote_id = $1
            ORDER BY display_order, created_utc
            "#,
        )
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to list quote items", e))?;

        timer.observe_duration();

        Ok(items)
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn delete_quote_item(&self, item_id: Uuid) -> Result<Option<QuoteItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_quote_item"])
            .start_timer();

        let item = sqlx::query_as::<_, QuoteItem>(
            r#"
            DELETE FROM quote_items
            WHERE item_id = $1
            RETURNING item_id, quote_id, name, description, quantity, price, tax_rate_id, display_order, created_utc
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to delete quote item", e))?;

        timer.observe_duration();

        Ok(item)
    }

    #[instrument(skip(self, tax), fields(quote_id = %tax.quote_id))]
    async fn insert_quote_tax(&self, tax: &QuoteTaxRate) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_quote_tax"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO quote_tax_rates (
                quote_tax_rate_id, quote_id, tax_rate_id, include_item_tax, tax_total
            )
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(tax.quote_tax_rate_id)
        .bind(tax.quote_id)
        .bind(tax.tax_rate_id)
        .bind(tax.include_item_tax)
        .bind(tax.tax_total)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("Failed to insert quote tax rate", e))?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self), fields(quote_id = %quote_id))]
    async fn list_quote_taxes(&self, quote_id: Uuid) -> Result<Vec<QuoteTaxRate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_quote_taxes"])
            .start_timer();

        let taxes = sqlx::query_as::<_, QuoteTaxRate>(
            r#"
            SELECT quote_tax_rate_id, quote_id, tax_rate_id, include_item_tax, tax_total, created_utc
            FROM quote_tax_rates
            WHERE quote_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to list quote tax rates", e))?;

        timer.observe_duration();

        Ok(taxes)
    }

    #[instrument(skip(self), fields(quote_tax_rate_id = %quote_tax_rate_id))]
    async fn delete_quote_tax(
        &self,
        quote_tax_rate_id: Uuid,
    ) -> Result<Option<QuoteTaxRate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_quote_tax"])
            .start_timer();

        let tax = sqlx::query_as::<_, QuoteTaxRate>(
            r#"
            DELETE FROM quote_tax_rates
            WHERE quote_tax_rate_id = $1
            RETURNING quote_tax_rate_id, quote_id, tax_rate_id, include_item_tax, tax_total, created_utc
            "#,
        )
        .bind(quote_tax_rate_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to delete quote tax rate", e))?;

        timer.observe_duration();

        Ok(tax)
    }

    #[instrument(skip(self, totals), fields(quote_id = %quote_id))]
    async fn set_quote_tax_totals(
        &self,
        quote_id: Uuid,
        totals: &[(Uuid, Decimal)],
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["set_quote_tax_totals"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("Failed to begin transaction", e))?;

        for (quote_tax_rate_id, total) in totals {
            sqlx::query(
                r#"
                UPDATE quote_tax_rates
                SET tax_total = $3
                WHERE quote_id = $1 AND quote_tax_rate_id = $2
                "#,
            )
            .bind(quote_id)
            .bind(quote_tax_rate_id)
            .bind(total)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("Failed to set quote tax total", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit tax totals", e))?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self, invoice, items, taxes), fields(invoice_id = %invoice.invoice_id))]
    async fn insert_invoice_aggregate(
        &self,
        invoice: &Invoice,
        items: &[InvoiceItem],
        taxes: &[InvoiceTaxRate],
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice_aggregate"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("Failed to begin transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                invoice_id, client_id, invoice_group_id, user_id, number, status,
                created_at, due_at, url_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(invoice.invoice_id)
        .bind(invoice.client_id)
        .bind(invoice.invoice_group_id)
        .bind(invoice.user_id)
        .bind(&invoice.number)
        .bind(&invoice.status)
        .bind(invoice.created_at)
        .bind(invoice.due_at)
        .bind(&invoice.url_key)
        .execute(&mut *tx)
        .await
        .map_err(|e| number_err("invoice", &invoice.number, e))?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    item_id, invoice_id, name, description, quantity, price, tax_rate_id, display_order
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.item_id)
            .bind(item.invoice_id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.price)
            .bind(item.tax_rate_id)
            .bind(item.display_order)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("Failed to insert invoice item", e))?;
        }

        for tax in taxes {
            sqlx::query(
                r#"
                INSERT INTO invoice_tax_rates (
                    invoice_tax_rate_id, invoice_id, tax_rate_id, include_item_tax, tax_total
                )
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(tax.invoice_tax_rate_id)
            .bind(tax.invoice_id)
            .bind(tax.tax_rate_id)
            .bind(tax.include_item_tax)
            .bind(tax.tax_total)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("Failed to insert invoice tax rate", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_err("Failed to commit invoice", e))?;

        timer.observe_duration();

        info!(invoice_id = %invoice.invoice_id, number = %invoice.number, "Invoice created");

        Ok(())
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE invoice_id = $1"
        ))
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("Failed to get invoice", e))?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn list_invoice_items(&self, invoice_id: Uuid) -> Result<Vec<InvoiceItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoice_items"])
            .start_timer();

        let items = sqlx::query_as::<_, InvoiceItem>(
            r#"
            SELECT item_id, invoice_id, name, description, quantity, price, tax_rate_id, display_order, created_utc
            FROM invoice_items
            WHERE invoice_id = $1
            ORDER BY display_order, created_utc
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to list invoice items", e))?;

        timer.observe_duration();

        Ok(items)
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn list_invoice_taxes(
        &self,
        invoice_id: Uuid,
    ) -> Result<Vec<InvoiceTaxRate>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoice_taxes"])
            .start_timer();

        let taxes = sqlx::query_as::<_, InvoiceTaxRate>(
            r#"
            SELECT invoice_tax_rate_id, invoice_id, tax_rate_id, include_item_tax, tax_total, created_utc
            FROM invoice_tax_rates
            WHERE invoice_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to list invoice tax rates", e))?;

        timer.observe_duration();

        Ok(taxes)
    }

    #[instrument(skip(self, record))]
    async fn insert_item_lookup(
        &self,
        record: &ItemLookupRecord,
    ) -> Result<ItemLookup, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_item_lookup"])
            .start_timer();

        let lookup = sqlx::query_as::<_, ItemLookup>(
            r#"
            INSERT INTO item_lookups (item_lookup_id, name, description, price)
            VALUES ($1, $2, $3, $4)
            RETURNING item_lookup_id, name, description, price, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&record.name)
        .bind(&record.description)
        .bind(record.price)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("Failed to insert item lookup", e))?;

        timer.observe_duration();

        Ok(lookup)
    }

    #[instrument(skip(self))]
    async fn list_item_lookups(&self) -> Result<Vec<ItemLookup>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_item_lookups"])
            .start_timer();

        let lookups = sqlx::query_as::<_, ItemLookup>(
            r#"
            SELECT item_lookup_id, name, description, price, created_utc
            FROM item_lookups
            ORDER BY name, created_utc
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("Failed to list item lookups", e))?;

        timer.observe_duration();

        Ok(lookups)
    }
}
