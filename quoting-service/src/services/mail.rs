//! Outbound quote mail behind a transport port.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use service_core::error::AppError;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};
use validator::Validate;

use crate::config::Settings;
use crate::models::MailQuote;
use crate::services::metrics::{ERRORS_TOTAL, MAILS_TOTAL};
use crate::store::BillingStore;

/// Fully addressed outbound message.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub cc: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Mail transport port.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError>;
}

/// SMTP transport via lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        let host = settings
            .smtp_host
            .as_deref()
            .ok_or_else(|| AppError::MailTransport("SMTP host is not configured".to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(settings.smtp_port);

        if let (Some(user), Some(password)) = (&settings.smtp_user, &settings.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn parse_mailbox(kind: &str, address: &str) -> Result<Mailbox, AppError> {
    address
        .parse()
        .map_err(|e| AppError::MailTransport(format!("Invalid {} address '{}': {}", kind, address, e)))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError> {
        let mut builder = Message::builder()
            .from(parse_mailbox("from", &message.from)?)
            .to(parse_mailbox("to", &message.to)?)
            .subject(&message.subject);

        if let Some(cc) = &message.cc {
            builder = builder.cc(parse_mailbox("cc", cc)?);
        }

        let email = builder
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())?;

        self.transport.send(email).await?;

        info!(to = %message.to, subject = %message.subject, "Mail sent");

        Ok(())
    }
}

/// Addresses and sends mail for a quote.
pub struct QuoteMailer {
    store: Arc<dyn BillingStore>,
    mailer: Arc<dyn Mailer>,
}

impl QuoteMailer {
    pub fn new(store: Arc<dyn BillingStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Mail a quote to a recipient. The sender is the quote owner's address
    /// when one is on record, falling back to `mail_from`. Transport failures
    /// surface as [`AppError::MailTransport`]; there is no retry.
    #[instrument(skip(self, input, settings), fields(quote_id = %input.quote_id))]
    pub async fn mail_quote(
        &self,
        input: &MailQuote,
        settings: &Settings,
    ) -> Result<(), AppError> {
        input.validate()?;

        if !settings.mail_configured() {
            return Err(AppError::MailTransport(
                "Outbound mail is not configured".to_string(),
            ));
        }

        let quote = self.store.get_quote(input.quote_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Quote {} not found", input.quote_id))
        })?;

        let owner = self.store.get_user(quote.user_id).await?;
        let from = owner
            .map(|u| u.email)
            .or_else(|| settings.mail_from.clone())
            .ok_or_else(|| {
                AppError::MailTransport("No sender address is configured".to_string())
            })?;

        let message = MailMessage {
            from,
            to: input.to.clone(),
            cc: settings.mail_cc_default.clone(),
            subject: input.subject.clone(),
            body: input.body.clone(),
        };

        let result = self.mailer.send(&message).await;

        let status = if result.is_ok() { "sent" } else { "failed" };
        MAILS_TOTAL.with_label_values(&[status]).inc();
        if result.is_err() {
            ERRORS_TOTAL.with_label_values(&["mail_transport"]).inc();
        }

        result
    }
}

/// Captures messages for test assertions instead of sending them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose sends always fail with a transport error.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::MailTransport(
                "Connection refused".to_string(),
            ));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}
