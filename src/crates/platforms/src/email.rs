//! Transactional email over provider HTTP APIs.
//!
//! Supported providers and their send endpoints:
//!
//! | Provider | Endpoint | Auth |
//! |---|---|---|
//! | Brevo | `POST /v3/smtp/email` | `api-key` header |
//! | SendGrid | `POST /v3/mail/send` | bearer |
//! | Resend | `POST /emails` | bearer |

use crate::error::{PlatformError, Result};
use crate::http::{build_client, check_status, normalize_base};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    #[default]
    Brevo,
    Sendgrid,
    Resend,
}

impl EmailProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailProvider::Brevo => "brevo",
            EmailProvider::Sendgrid => "sendgrid",
            EmailProvider::Resend => "resend",
        }
    }

    pub fn default_api_base(&self) -> &'static str {
        match self {
            EmailProvider::Brevo => "https://api.brevo.com",
            EmailProvider::Sendgrid => "https://api.sendgrid.com",
            EmailProvider::Resend => "https://api.resend.com",
        }
    }

    fn send_path(&self) -> &'static str {
        match self {
            EmailProvider::Brevo => "/v3/smtp/email",
            EmailProvider::Sendgrid => "/v3/mail/send",
            EmailProvider::Resend => "/emails",
        }
    }
}

impl fmt::Display for EmailProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailProvider {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brevo" | "sendinblue" => Ok(EmailProvider::Brevo),
            "sendgrid" => Ok(EmailProvider::Sendgrid),
            "resend" => Ok(EmailProvider::Resend),
            other => Err(PlatformError::Config(format!("Provider {} non supporté", other))),
        }
    }
}

/// A message ready to hand to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub from_email: String,
    pub from_name: String,
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// What the provider acknowledged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    pub provider: EmailProvider,
    pub message_id: Option<String>,
}

#[derive(Clone)]
pub struct EmailClient {
    provider: EmailProvider,
    api_key: String,
    api_base: String,
    client: Client,
}

impl EmailClient {
    pub fn new(provider: EmailProvider, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PlatformError::Config(format!("{} API key is empty", provider)));
        }
        Ok(Self {
            provider,
            api_key,
            api_base: provider.default_api_base().to_string(),
            client: build_client(timeout)?,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = normalize_base(api_base);
        self
    }

    pub fn provider(&self) -> EmailProvider {
        self.provider
    }

    fn payload(&self, email: &OutgoingEmail) -> Value {
        match self.provider {
            EmailProvider::Brevo => {
                let mut body = json!({
                    "sender": { "name": email.from_name, "email": email.from_email },
                    "to": [{ "email": email.to }],
                    "subject": email.subject,
                    "htmlContent": email.html,
                    "textContent": email.text,
                });
                if let Some(reply_to) = &email.reply_to {
                    body["replyTo"] = json!({ "email": reply_to });
                }
                body
            }
            EmailProvider::Sendgrid => {
                let mut body = json!({
                    "personalizations": [{ "to": [{ "email": email.to }] }],
                    "from": { "email": email.from_email, "name": email.from_name },
                    "subject": email.subject,
                    "content": [
                        { "type": "text/plain", "value": email.text },
                        { "type": "text/html", "value": email.html }
                    ],
                });
                if let Some(reply_to) = &email.reply_to {
                    body["reply_to"] = json!({ "email": reply_to });
                }
                body
            }
            EmailProvider::Resend => {
                let mut body = json!({
                    "from": format!("{} <{}>", email.from_name, email.from_email),
                    "to": [email.to],
                    "subject": email.subject,
                    "html": email.html,
                    "text": email.text,
                });
                if let Some(reply_to) = &email.reply_to {
                    body["reply_to"] = json!(reply_to);
                }
                body
            }
        }
    }

    pub async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt> {
        let url = format!("{}{}", self.api_base, self.provider.send_path());
        let request = self.client.post(url).json(&self.payload(email));
        let request = match self.provider {
            EmailProvider::Brevo => request.header("api-key", &self.api_key),
            EmailProvider::Sendgrid | EmailProvider::Resend => request.bearer_auth(&self.api_key),
        };

        tracing::debug!(provider = %self.provider, to = %email.to, "Sending email");
        let response = check_status(self.provider.as_str(), request.send().await?).await?;

        let header_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message_id = body
            .get("messageId")
            .or_else(|| body.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or(header_id);

        Ok(SendReceipt {
            provider: self.provider,
            message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OutgoingEmail {
        OutgoingEmail {
            from_email: "noreply@awema.fr".into(),
            from_name: "AWEMA".into(),
            to: "client@example.fr".into(),
            reply_to: Some("contact@awema.fr".into()),
            subject: "Bonjour".into(),
            html: "<p>Bonjour</p>".into(),
            text: "Bonjour".into(),
        }
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("Brevo".parse::<EmailProvider>().unwrap(), EmailProvider::Brevo);
        assert_eq!("resend".parse::<EmailProvider>().unwrap(), EmailProvider::Resend);
        assert!("smtp".parse::<EmailProvider>().is_err());
    }

    #[test]
    fn test_payload_shapes() {
        let timeout = Duration::from_secs(5);
        let brevo = EmailClient::new(EmailProvider::Brevo, "k", timeout).unwrap();
        let body = brevo.payload(&sample());
        assert_eq!(body["sender"]["email"], "noreply@awema.fr");
        assert_eq!(body["replyTo"]["email"], "contact@awema.fr");

        let sendgrid = EmailClient::new(EmailProvider::Sendgrid, "k", timeout).unwrap();
        let body = sendgrid.payload(&sample());
        assert_eq!(body["personalizations"][0]["to"][0]["email"], "client@example.fr");
        assert_eq!(body["content"][1]["type"], "text/html");

        let resend = EmailClient::new(EmailProvider::Resend, "k", timeout).unwrap();
        let body = resend.payload(&sample());
        assert_eq!(body["from"], "AWEMA <noreply@awema.fr>");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(EmailClient::new(EmailProvider::Resend, " ", Duration::from_secs(1)).is_err());
    }
}
