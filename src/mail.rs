//! Outbound notifications.
//!
//! Delivery is fire-and-forget: [`dispatch`] hands the message to a spawned
//! task and the caller never waits on, or fails because of, the mailer.

use std::sync::Arc;

use crate::model::Employee;
use crate::router::BoxFuture;
use crate::{Error, Result};

/// A rendered message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Mail transport.
pub trait Mailer: Send + Sync {
    fn send(&self, notification: Notification) -> BoxFuture<'static, Result<()>>;
}

/// Writes notifications to the log instead of delivering them.
pub struct LogMailer {
    sender: String,
}

impl LogMailer {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
        }
    }
}

impl Mailer for LogMailer {
    fn send(&self, notification: Notification) -> BoxFuture<'static, Result<()>> {
        let sender = self.sender.clone();
        Box::pin(async move {
            if notification.recipient.is_empty() {
                return Err(Error::BadRequest("notification has no recipient".into()));
            }
            tracing::info!(
                from = %sender,
                to = %notification.recipient,
                subject = %notification.subject,
                body = %notification.body,
                "mail (log only)"
            );
            Ok(())
        })
    }
}

/// Welcome message for a newly created employee.
pub fn welcome(employee: &Employee, organization: &str) -> Notification {
    let role = employee.role_name.as_deref().unwrap_or("an unassigned role");
    let groups = employee.permissions.enabled_groups();

    let mut body = format!(
        "Hello {},\n\nYour {organization} account has been created.\n\
         Employee ID: {}\nRole: {role}\n",
        employee.full_name, employee.employee_id
    );
    if groups.is_empty() {
        body.push_str("\nNo application access has been granted yet.\n");
    } else {
        body.push_str("\nYou have access to:\n");
        for group in groups {
            body.push_str("  - ");
            body.push_str(group.label());
            body.push('\n');
        }
    }

    Notification {
        recipient: employee.email.clone(),
        subject: format!("Welcome to {organization}"),
        body,
    }
}

/// Send on a background task. Failures are logged.
pub fn dispatch(mailer: Arc<dyn Mailer>, notification: Notification) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let recipient = notification.recipient.clone();
        if let Err(e) = mailer.send(notification).await {
            tracing::error!(to = %recipient, error = %e, "notification failed");
        }
    })
}
