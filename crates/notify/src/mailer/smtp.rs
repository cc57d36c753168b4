//! SMTP mailer backed by lettre's async transport.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::{MailMessage, Mailer};
use crate::config::MailConfig;
use crate::error::NotifyError;

/// Upper bound for connecting to and conversing with the SMTP server.
pub const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

struct Transport {
    smtp: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Transport {
    /// Builds the wire message with the configured sender.
    fn compose(&self, message: MailMessage) -> Result<Message, NotifyError> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(message.to.parse::<Mailbox>()?)
            .subject(message.subject)
            .header(ContentType::TEXT_HTML)
            .body(message.html)?)
    }
}

/// Sends mail through an SMTP relay.
///
/// The transport is built once from [`MailConfig`]. Without credentials the
/// mailer reports itself unconfigured and refuses to send.
pub struct SmtpMailer {
    transport: Option<Transport>,
}

impl SmtpMailer {
    /// A mailer that never sends.
    pub fn disabled() -> Self {
        Self { transport: None }
    }

    /// Builds the SMTP transport from configuration.
    pub fn new(config: &MailConfig) -> Result<Self, NotifyError> {
        let (Some(credentials), Some(sender)) = (config.credentials(), config.sender()) else {
            tracing::warn!(host = %config.host, "mail credentials not configured, emails disabled");
            return Ok(Self::disabled());
        };

        let builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .tls(Tls::Opportunistic(TlsParameters::new(config.host.clone())?))
        };

        let smtp = builder
            .port(config.port)
            .credentials(credentials)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        tracing::info!(host = %config.host, port = config.port, secure = config.secure, "SMTP mailer ready");

        Ok(Self {
            transport: Some(Transport {
                smtp,
                from: sender.parse()?,
            }),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    async fn send(&self, message: MailMessage) -> Result<(), NotifyError> {
        let transport = self.transport.as_ref().ok_or(NotifyError::NotConfigured)?;

        let email = transport.compose(message)?;
        transport.smtp.send(email).await?;
        Ok(())
    }
}
