// src/mailer.rs

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::{error::AppError, models::contact::ContactRequest, utils::html::escape_text};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// A rendered message ready to hand to a provider.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub reply_to: String,
    pub html: String,
}

impl Email {
    /// Renders a contact form submission. Every user-supplied field is
    /// escaped before it reaches the HTML body.
    pub fn from_contact(contact: &ContactRequest, from: &str, to: &str) -> Self {
        let name = escape_text(&contact.name);
        let email = escape_text(&contact.email);
        let message = escape_text(&contact.message);
        Self {
            from: from.to_string(),
            to: vec![to.to_string()],
            subject: format!("New message from {} via the portfolio", contact.name),
            reply_to: contact.email.clone(),
            html: format!(
                "<p>You received a new message from the contact form.</p>\
                 <p><strong>Name:</strong> {name}</p>\
                 <p><strong>Email:</strong> {email}</p>\
                 <p><strong>Message:</strong></p>\
                 <p>{message}</p>"
            ),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), AppError>;
}

/// Delivers through the Resend HTTP API.
pub struct ResendMailer {
    http: reqwest::Client,
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        let response = self
            .http
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": email.from,
                "to": email.to,
                "subject": email.subject,
                "reply_to": email.reply_to,
                "html": email.html,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "resend rejected message: {}", body);
            return Err(AppError::InternalServerError(format!(
                "mail provider returned {}",
                status
            )));
        }

        tracing::info!(to = ?email.to, "contact message delivered");
        Ok(())
    }
}

/// Stand-in for local runs without an API key: the message goes to the log.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), AppError> {
        tracing::info!(
            to = ?email.to,
            reply_to = %email.reply_to,
            subject = %email.subject,
            "mail delivery disabled, message logged only"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_fields_are_escaped_in_html() {
        let contact = ContactRequest {
            name: "Eve".to_string(),
            email: "eve@example.com".to_string(),
            message: "<script>alert('x')</script> hello there".to_string(),
        };
        let email = Email::from_contact(&contact, "site@example.com", "me@example.com");

        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("hello there"));
        assert_eq!(email.reply_to, "eve@example.com");
        assert_eq!(email.to, vec!["me@example.com".to_string()]);
    }
}
