pub mod convert;
pub mod copy;
pub mod items;
pub mod mail;
pub mod metrics;
pub mod notify;
pub mod numbering;
pub mod quotes;
pub mod tax;

pub use convert::ConversionEngine;
pub use copy::CopyEngine;
pub use items::ItemManager;
pub use mail::{MailMessage, Mailer, QuoteMailer, RecordingMailer, SmtpMailer};
pub use notify::{Notifier, RecordingNotifier, TracingNotifier};
pub use numbering::NumberGenerator;
pub use quotes::QuoteLifecycle;
pub use tax::TaxRateCalculator;
