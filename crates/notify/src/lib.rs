//! Transactional email notifications for order changes.
//!
//! Notifications are best effort: the [`NotificationDispatcher`] sends each
//! one on a detached task, checks its preconditions first, and logs rather
//! than returns every failure. The business operation that triggered a
//! notification never waits for it and never fails because of it.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod mailer;
pub mod templates;

pub use config::MailConfig;
pub use dispatcher::{Delivery, NotificationDispatcher, ShippingNotice, SkipReason, StatusNotice};
pub use error::NotifyError;
pub use mailer::{InMemoryMailer, MailMessage, Mailer, SmtpMailer};
