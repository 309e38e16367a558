use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Url;
use serde::Serialize;
use shop_types::ports::notifier::{Email, Notifier, NotifyError};

pub const SENDGRID_BASE_URL: &str = "https://api.sendgrid.com";

/// SendGrid v3 mail sender.
///
/// Missing API key or sender address turns every `send` into a logged no-op.
#[derive(Clone)]
pub struct SendGridMailer {
    base: Url,
    api_key: Option<String>,
    sender: Option<String>,
    client: reqwest::Client,
}

impl SendGridMailer {
    pub fn new(api_key: Option<String>, sender: Option<String>) -> anyhow::Result<Self> {
        Self::with_base_url(SENDGRID_BASE_URL, api_key, sender)
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: Option<String>,
        sender: Option<String>,
    ) -> anyhow::Result<Self> {
        let base = Url::parse(base_url).context("invalid mail provider url")?;
        Ok(Self {
            base,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            sender: sender.filter(|s| !s.trim().is_empty()),
            client: reqwest::Client::new(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.sender.is_some()
    }
}

#[derive(Serialize, Debug)]
struct MailAddress<'a> {
    email: &'a str,
}

#[derive(Serialize, Debug)]
struct Personalization<'a> {
    to: Vec<MailAddress<'a>>,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    value: &'a str,
}

#[derive(Serialize, Debug)]
struct MailAttachment<'a> {
    content: String,
    filename: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    disposition: &'a str,
}

#[derive(Serialize, Debug)]
struct SendRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: MailAddress<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<MailAttachment<'a>>,
}

#[async_trait]
impl Notifier for SendGridMailer {
    async fn send(&self, email: Email) -> Result<(), NotifyError> {
        let (Some(api_key), Some(sender)) = (self.api_key.as_deref(), self.sender.as_deref())
        else {
            tracing::warn!(
                subject = %email.subject,
                "mail provider not configured, dropping message"
            );
            return Ok(());
        };

        let attachments = email
            .attachment
            .as_ref()
            .map(|a| MailAttachment {
                content: STANDARD.encode(&a.content),
                filename: &a.filename,
                kind: &a.mime_type,
                disposition: "attachment",
            })
            .into_iter()
            .collect();

        let request = SendRequest {
            personalizations: vec![Personalization {
                to: vec![MailAddress {
                    email: &email.recipient,
                }],
            }],
            from: MailAddress { email: sender },
            subject: &email.subject,
            content: vec![Content {
                kind: "text/plain",
                value: &email.body,
            }],
            attachments,
        };

        let url = self
            .base
            .join("v3/mail/send")
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        let res = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        tracing::info!(subject = %email.subject, "mail handed to provider");
        Ok(())
    }

    fn shop_address(&self) -> Option<&str> {
        self.sender.as_deref()
    }
}
