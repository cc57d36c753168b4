//! Fire-and-forget notification dispatch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{OrderId, OrderStatus};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::mailer::{MailMessage, Mailer};
use crate::templates;

/// Name used when the order carries no recipient name.
pub const DEFAULT_RECIPIENT_NAME: &str = "Customer";

/// Default cap on concurrently running sends.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Data for a status-change email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotice {
    pub order_id: OrderId,
    pub email: Option<String>,
    pub recipient_name: Option<String>,
    pub status: OrderStatus,
}

/// Data for a shipping-update email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingNotice {
    pub order_id: OrderId,
    pub email: String,
    pub shipping_method: String,
    pub shipping_terms: String,
    pub shipment_date: DateTime<Utc>,
    pub delivery_date: DateTime<Utc>,
}

/// Why a notification was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Mail credentials are missing.
    NotConfigured,
    /// The recipient address is missing or has no `@`.
    InvalidRecipient,
}

/// Outcome of one dispatched notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Skipped(SkipReason),
    Failed,
}

/// Sends order notifications on detached tasks.
///
/// Every `notify_*` call returns immediately with the handle of the spawned
/// task. Callers are free to drop it; the task still runs to completion and
/// logs its own outcome. Nothing a mailer does can surface as an error here.
#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    permits: Arc<Semaphore>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher with the default in-flight limit.
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self::with_max_in_flight(mailer, DEFAULT_MAX_IN_FLIGHT)
    }

    /// Creates a dispatcher allowing at most `limit` concurrent sends.
    /// Further notifications wait for a free slot on their own task.
    pub fn with_max_in_flight(mailer: Arc<dyn Mailer>, limit: usize) -> Self {
        Self {
            mailer,
            permits: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    /// Announces a status change to the order's contact email.
    pub fn notify_status_change(&self, notice: StatusNotice) -> JoinHandle<Delivery> {
        let name = notice
            .recipient_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_RECIPIENT_NAME);
        let (subject, html) = templates::status_changed(notice.order_id, name, notice.status);

        self.spawn(notice.order_id, notice.email, subject, html)
    }

    /// Announces shipping details to the given email.
    pub fn notify_shipping_update(&self, notice: ShippingNotice) -> JoinHandle<Delivery> {
        let (subject, html) = templates::shipping_updated(
            notice.order_id,
            &notice.shipping_method,
            &notice.shipping_terms,
            &notice.shipment_date,
            &notice.delivery_date,
        );

        self.spawn(notice.order_id, Some(notice.email), subject, html)
    }

    fn spawn(
        &self,
        order_id: OrderId,
        to: Option<String>,
        subject: String,
        html: String,
    ) -> JoinHandle<Delivery> {
        let mailer = self.mailer.clone();
        let permits = self.permits.clone();

        tokio::spawn(async move {
            // Held until the send settles
            let _permit = permits.acquire_owned().await.ok();
            deliver(mailer.as_ref(), order_id, to, subject, html).await
        })
    }
}

async fn deliver(
    mailer: &dyn Mailer,
    order_id: OrderId,
    to: Option<String>,
    subject: String,
    html: String,
) -> Delivery {
    if !mailer.is_configured() {
        tracing::warn!(%order_id, "mail credentials not configured, skipping notification");
        metrics::counter!("notifications_skipped_total", "reason" => "not_configured").increment(1);
        return Delivery::Skipped(SkipReason::NotConfigured);
    }

    let to = match to {
        Some(to) if to.contains('@') => to,
        other => {
            tracing::warn!(
                %order_id,
                email = %mask_email(other.as_deref().unwrap_or_default()),
                "invalid recipient email, skipping notification"
            );
            metrics::counter!("notifications_skipped_total", "reason" => "invalid_recipient")
                .increment(1);
            return Delivery::Skipped(SkipReason::InvalidRecipient);
        }
    };

    let masked = mask_email(&to);
    match mailer.send(MailMessage { to, subject, html }).await {
        Ok(()) => {
            tracing::info!(%order_id, email = %masked, "notification sent");
            metrics::counter!("notifications_sent_total").increment(1);
            Delivery::Sent
        }
        Err(err) => {
            tracing::warn!(%order_id, email = %masked, error = %err, "failed to send notification");
            metrics::counter!("notifications_failed_total").increment(1);
            Delivery::Failed
        }
    }
}

/// Hides most of the local part of an address for logging:
/// `alice@example.com` becomes `a***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}
