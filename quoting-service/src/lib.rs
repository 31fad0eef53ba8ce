//! quoting-service: quote lifecycle and conversion engine.
//!
//! The engine exposes operation-level entry points (create/update/delete a
//! quote, attach taxes, copy a quote, convert a quote into an invoice) and
//! delegates all durable writes to the [`store::BillingStore`] port. The HTTP
//! layer, templating and authentication live outside this crate.
pub mod config;
pub mod models;
pub mod services;
pub mod store;
