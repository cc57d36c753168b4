//! Mail transport trait and implementations.

pub mod memory;
pub mod smtp;

use async_trait::async_trait;

use crate::error::NotifyError;

pub use memory::InMemoryMailer;
pub use smtp::SmtpMailer;

/// A rendered email ready to hand to a transport.
///
/// The sender is not part of the message; each transport stamps its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Trait for sending emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Returns false when credentials are missing and nothing can be sent.
    fn is_configured(&self) -> bool;

    /// Sends one message.
    async fn send(&self, message: MailMessage) -> Result<(), NotifyError>;
}
