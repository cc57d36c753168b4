//! Mail transport configuration loaded from environment variables.

use lettre::transport::smtp::authentication::Credentials;

/// SMTP settings, read once when the mailer is built.
///
/// Reads from environment variables:
/// - `MAIL_HOST` — SMTP server (default: `"smtp.gmail.com"`)
/// - `MAIL_PORT` — SMTP port (default: `587`)
/// - `MAIL_SECURE` — implicit TLS when `true`, STARTTLS when offered otherwise
///   (default: `false`)
/// - `MAIL_USER` / `MAIL_PASSWORD` — credentials; sending is skipped without them
/// - `MAIL_FROM` — sender address (default: `MAIL_USER`)
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

impl MailConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("MAIL_HOST").unwrap_or(defaults.host),
            port: std::env::var("MAIL_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            secure: std::env::var("MAIL_SECURE")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.secure),
            user: non_empty(std::env::var("MAIL_USER").ok()),
            password: non_empty(std::env::var("MAIL_PASSWORD").ok()),
            from: non_empty(std::env::var("MAIL_FROM").ok()),
        }
    }

    /// Returns the SMTP credentials when both user and password are set.
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some(Credentials::new(user.clone(), password.clone())),
            _ => None,
        }
    }

    /// Sender address: `from` when set, otherwise the login user.
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.user.as_deref())
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            secure: false,
            user: None,
            password: None,
            from: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
