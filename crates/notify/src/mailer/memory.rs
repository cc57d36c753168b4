//! In-memory mailer for tests and local runs.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use super::{MailMessage, Mailer};
use crate::error::NotifyError;

#[derive(Debug, Default)]
struct InMemoryMailerState {
    sent: Vec<MailMessage>,
    attempts: usize,
    fail_on_send: bool,
}

/// In-memory mailer that records messages instead of sending them.
#[derive(Debug, Clone)]
pub struct InMemoryMailer {
    state: Arc<RwLock<InMemoryMailerState>>,
    configured: bool,
}

impl Default for InMemoryMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMailer {
    /// Creates a configured in-memory mailer.
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            configured: true,
        }
    }

    /// Creates a mailer that reports missing credentials.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    /// Configures the mailer to fail every send call.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the messages delivered so far.
    pub fn sent(&self) -> Vec<MailMessage> {
        self.state.read().unwrap().sent.clone()
    }

    /// Returns the number of send calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.state.read().unwrap().attempts
    }

    /// Waits until at least `count` send calls were made or `timeout` elapses.
    ///
    /// Returns true if the count was reached.
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.attempts() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send(&self, message: MailMessage) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();
        state.attempts += 1;

        if state.fail_on_send {
            return Err(NotifyError::Rejected("535 authentication failed".to_string()));
        }

        state.sent.push(message);
        Ok(())
    }
}
