//! Email notification worker.
//!
//! Subscribes to the domain event bus and turns committed state changes
//! into outgoing emails. Delivery is fire-and-forget: a failed send is
//! logged and counted, never propagated back to the request that caused
//! the event.

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::{Config, MailConfig};
use crate::events::{DomainEvent, EventBus};
use crate::mailer::Mailer;

/// A rendered email, ready to hand to the mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    config: Arc<RwLock<Config>>,
}

impl Notifier {
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>, config: Arc<RwLock<Config>>) -> Self {
        Self { mailer, config }
    }

    /// Spawns the worker loop. The handle is only useful for shutdown
    /// tests; the loop ends on its own when the bus closes.
    pub fn start(self, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();

        tokio::spawn(async move {
            info!("Notification worker started");
            loop {
                match rx.recv().await {
                    Ok(event) => self.handle(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification worker lagged, events dropped");
                        metrics::counter!("notifier_lagged_events_total").increment(skipped);
                    }
                    Err(RecvError::Closed) => {
                        info!("Event bus closed, notification worker stopping");
                        break;
                    }
                }
            }
        })
    }

    async fn handle(&self, event: DomainEvent) {
        let (mail, public_url) = {
            let config = self.config.read().await;
            (config.mail.clone(), config.server.public_url.clone())
        };

        for email in render(&event, &mail, &public_url) {
            match self.mailer.send(&email.to, &email.subject, &email.body).await {
                Ok(()) => {
                    metrics::counter!("emails_sent_total").increment(1);
                }
                Err(err) => {
                    metrics::counter!("email_failures_total").increment(1);
                    error!(to = %email.to, %err, "Failed to send notification email");
                }
            }
        }
    }
}

/// Turns an event into zero or more emails using the configured templates.
#[must_use]
pub fn render(event: &DomainEvent, mail: &MailConfig, public_url: &str) -> Vec<OutgoingEmail> {
    match event {
        DomainEvent::RegistrationCompleted { email, first_name, token } => {
            vec![OutgoingEmail {
                to: email.clone(),
                subject: mail.confirm_subject.clone(),
                body: format!(
                    "Hello {first_name},\n\n{}\n{public_url}{}{token}\n",
                    mail.confirm_message, mail.confirm_path
                ),
            }]
        }
        DomainEvent::PasswordResetRequested { email, token } => {
            vec![OutgoingEmail {
                to: email.clone(),
                subject: mail.reset_subject.clone(),
                body: format!(
                    "{}\n{public_url}{}{token}\n",
                    mail.reset_message, mail.reset_path
                ),
            }]
        }
        DomainEvent::DocumentAdded { account_name, document_name, recipients } => {
            document_change_emails(account_name, document_name, recipients, public_url, "added to")
        }
        DomainEvent::DocumentRemoved { account_name, document_name, recipients } => {
            document_change_emails(
                account_name,
                document_name,
                recipients,
                public_url,
                "removed from",
            )
        }
    }
}

fn document_change_emails(
    account_name: &str,
    document_name: &str,
    recipients: &[String],
    public_url: &str,
    verb: &str,
) -> Vec<OutgoingEmail> {
    let subject = format!("Document {verb} account {account_name}");
    let body = format!(
        "A file named \"{document_name}\" has been {verb} the account named \"{account_name}\".\n\
         Visit {public_url}/login to log in and view the account.\n"
    );

    recipients
        .iter()
        .map(|to| OutgoingEmail {
            to: to.clone(),
            subject: subject.clone(),
            body: body.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_email_links_the_token() {
        let mail = MailConfig::default();
        let event = DomainEvent::RegistrationCompleted {
            email: "a@b.com".to_string(),
            first_name: "Ada".to_string(),
            token: "tok-123".to_string(),
        };

        let emails = render(&event, &mail, "https://docs.example");
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].to, "a@b.com");
        assert!(
            emails[0]
                .body
                .contains("https://docs.example/register/confirm?token=tok-123")
        );
    }

    #[test]
    fn document_added_fans_out_to_all_members() {
        let mail = MailConfig::default();
        let event = DomainEvent::DocumentAdded {
            account_name: "acme".to_string(),
            document_name: "report.pdf".to_string(),
            recipients: vec!["a@b.com".to_string(), "c@d.com".to_string()],
        };

        let emails = render(&event, &mail, "https://docs.example");
        assert_eq!(emails.len(), 2);
        assert!(emails.iter().all(|e| e.body.contains("report.pdf")));
        assert!(emails.iter().all(|e| e.body.contains("added to")));
    }

    #[test]
    fn reset_email_uses_reset_path() {
        let mail = MailConfig::default();
        let event = DomainEvent::PasswordResetRequested {
            email: "a@b.com".to_string(),
            token: "tok-9".to_string(),
        };

        let emails = render(&event, &mail, "https://docs.example");
        assert!(
            emails[0]
                .body
                .contains("https://docs.example/user/changePassword?token=tok-9")
        );
    }
}
