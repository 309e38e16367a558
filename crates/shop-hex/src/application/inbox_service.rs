use std::sync::Arc;

use shop_types::ports::notifier::{Email, Notifier};

use crate::errors::AppError;

/// Contact form and newsletter sign-ups, both delivered to the shop's own inbox.
#[derive(Clone)]
pub struct InboxService {
    notifier: Arc<dyn Notifier>,
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(AppError::BadRequest(format!("{field} missing")));
    }
    Ok(v.to_string())
}

impl InboxService {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub async fn contact(&self, name: &str, email: &str, message: &str) -> Result<(), AppError> {
        let name = required(name, "name")?;
        let email = required(email, "email")?;
        let message = required(message, "message")?;
        self.deliver(
            format!("Neue Nachricht von {name}"),
            format!("Von: {name} <{email}>\n\nNachricht:\n{message}"),
        )
        .await
    }

    pub async fn newsletter(&self, email: &str) -> Result<(), AppError> {
        let email = required(email, "email")?;
        self.deliver(
            "Neue Newsletter-Anmeldung".to_string(),
            format!("Neue Anmeldung: {email}"),
        )
        .await
    }

    async fn deliver(&self, subject: String, body: String) -> Result<(), AppError> {
        let recipient = self.notifier.shop_address().unwrap_or_default().to_string();
        self.notifier
            .send(Email {
                subject,
                body,
                recipient,
                attachment: None,
            })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "inbox mail not delivered");
                AppError::Unavailable(e.to_string())
            })
    }
}
