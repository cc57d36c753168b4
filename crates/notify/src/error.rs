//! Notification error types.

use thiserror::Error;

/// Errors that can occur while sending an email.
///
/// These never leave the dispatcher; they exist so mailers can report what
/// went wrong for logging.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Mail credentials are missing.
    #[error("Mail transport is not configured")]
    NotConfigured,

    /// A sender or recipient address could not be parsed.
    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The message could not be assembled.
    #[error("Message build error: {0}")]
    Build(#[from] lettre::error::Error),

    /// The SMTP exchange failed (auth, timeout, rejected recipient).
    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The mailer refused the message for another reason.
    #[error("Mail rejected: {0}")]
    Rejected(String),
}
