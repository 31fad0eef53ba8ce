//! Domain models for quoting-service.

mod client;
mod invoice;
mod invoice_group;
mod item_lookup;
mod quote;
mod quote_item;
mod quote_tax_rate;
mod tax_rate;
mod user;

pub use client::Client;
pub use invoice::{ConvertQuote, Invoice, InvoiceItem, InvoiceStatus, InvoiceTaxRate};
pub use invoice_group::InvoiceGroup;
pub use item_lookup::{ItemLookup, ItemLookupRecord};
pub use quote::{CopyQuote, CreateQuote, MailQuote, Quote, QuoteStatus, UpdateQuote};
pub use quote_item::{ItemPayload, QuoteItem, QuoteItemRecord};
pub use quote_tax_rate::QuoteTaxRate;
pub use tax_rate::TaxRate;
pub use user::User;
