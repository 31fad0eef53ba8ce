//! Runtime settings for the quoting engine.
//!
//! Lifecycle operations receive a [`Settings`] value explicitly; nothing in
//! the engine reads process-wide configuration on its own.

use serde::Deserialize;
use service_core::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Days added to a quote's created date to derive `expires_at`.
    #[serde(default = "default_quotes_expire_after_days")]
    pub quotes_expire_after_days: i64,
    /// Days added to an invoice's created date to derive `due_at`.
    #[serde(default = "default_invoices_due_after_days")]
    pub invoices_due_after_days: i64,
    /// Default footer text stamped onto newly created quotes.
    #[serde(default)]
    pub quote_footer: String,
    /// Mail driver name; `None` means outbound mail is not configured.
    #[serde(default)]
    pub mail_driver: Option<String>,
    #[serde(default)]
    pub mail_from: Option<String>,
    #[serde(default)]
    pub mail_cc_default: Option<String>,
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: Option<String>,
    #[serde(default)]
    pub smtp_password: Option<String>,
}

fn default_quotes_expire_after_days() -> i64 {
    15
}

fn default_invoices_due_after_days() -> i64 {
    30
}

fn default_smtp_port() -> u16 {
    587
}

impl Settings {
    pub fn load() -> Result<Self, AppError> {
        service_core::config::load()
    }

    pub fn mail_configured(&self) -> bool {
        self.mail_driver.is_some()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quotes_expire_after_days: default_quotes_expire_after_days(),
            invoices_due_after_days: default_invoices_due_after_days(),
            quote_footer: String::new(),
            mail_driver: None,
            mail_from: None,
            mail_cc_default: None,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_user: None,
            smtp_password: None,
        }
    }
}
