use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MailConfig;

const MAX_ATTEMPTS: u32 = 3;

/// Outbound messages the service knows how to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Email {
    Invitation {
        username: String,
        activation_url: String,
    },
    PasswordReset {
        username: String,
        reset_url: String,
        expiry: String,
    },
}

impl Email {
    pub fn template(&self) -> &'static str {
        match self {
            Email::Invitation { .. } => "user_invitation",
            Email::PasswordReset { .. } => "password_reset",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            Email::Invitation { .. } => "Finish signing up for Habitisti",
            Email::PasswordReset { .. } => "Reset your Habitisti password",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Email::Invitation {
                username,
                activation_url,
            } => format!(
                "Hi {username},\n\nThanks for signing up. Confirm your email to activate your account:\n{activation_url}\n\nIf you did not sign up, ignore this message.\n"
            ),
            Email::PasswordReset {
                username,
                reset_url,
                expiry,
            } => format!(
                "Hi {username},\n\nSomeone asked to reset your password. The link below is valid for {expiry}:\n{reset_url}\n\nIf it was not you, ignore this message.\n"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers `email` and returns the provider's delivery id.
    async fn send(&self, to: &Recipient, email: &Email) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    from: Address<'a>,
    to: Vec<Address<'a>>,
    subject: &'a str,
    text: String,
    category: &'a str,
}

/// JSON mail API client (Mailtrap-compatible send endpoint).
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_email: String,
    from_name: String,
}

impl HttpMailer {
    pub fn new(config: &MailConfig, api_key: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build mail http client")?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }

    async fn send_once(&self, to: &Recipient, email: &Email) -> anyhow::Result<String> {
        let body = SendBody {
            from: Address {
                email: &self.from_email,
                name: Some(&self.from_name),
            },
            to: vec![Address {
                email: &to.email,
                name: Some(&to.name),
            }],
            subject: email.subject(),
            text: email.body(),
            category: email.template(),
        };

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("mail api request")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("mail api returned {status}: {text}");
        }

        let payload: serde_json::Value = resp.json().await.unwrap_or_default();
        let id = payload
            .get("message_ids")
            .and_then(|ids| ids.get(0))
            .and_then(|id| id.as_str())
            .map(str::to_owned)
            .unwrap_or_else(|| status.as_u16().to_string());
        Ok(id)
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &Recipient, email: &Email) -> anyhow::Result<String> {
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.send_once(to, email).await {
                Ok(id) => {
                    info!(template = email.template(), delivery_id = %id, attempt, "mail sent");
                    return Ok(id);
                }
                Err(e) => {
                    warn!(error = %e, template = email.template(), attempt, "mail send failed");
                    last_err = Some(e);
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(Duration::from_millis(250 * 2u64.pow(attempt - 1)))
                            .await;
                    }
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| anyhow::anyhow!("mail not sent"))
            .context(format!("sending {} failed after {MAX_ATTEMPTS} attempts", email.template())))
    }
}

/// Used when no mail API key is configured. Links are not logged.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, _to: &Recipient, email: &Email) -> anyhow::Result<String> {
        let id = Uuid::new_v4().to_string();
        debug!(template = email.template(), delivery_id = %id, "mail delivery skipped (no api key)");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invitation_body_carries_link() {
        let email = Email::Invitation {
            username: "alice".into(),
            activation_url: "http://example.test/confirm/abc".into(),
        };
        assert_eq!(email.template(), "user_invitation");
        let body = email.body();
        assert!(body.contains("alice"));
        assert!(body.contains("http://example.test/confirm/abc"));
    }

    #[test]
    fn reset_body_mentions_expiry() {
        let email = Email::PasswordReset {
            username: "bob".into(),
            reset_url: "http://example.test/reset-password/xyz".into(),
            expiry: "60 minutes".into(),
        };
        assert!(email.body().contains("60 minutes"));
        assert_eq!(email.subject(), "Reset your Habitisti password");
    }

    #[test]
    fn send_body_serializes_addresses() {
        let body = SendBody {
            from: Address {
                email: "no-reply@example.test",
                name: Some("Habitisti"),
            },
            to: vec![Address {
                email: "alice@x.test",
                name: None,
            }],
            subject: "s",
            text: "t".into(),
            category: "user_invitation",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["to"][0]["email"], "alice@x.test");
        assert!(json["to"][0].get("name").is_none());
        assert_eq!(json["from"]["name"], "Habitisti");
    }

    #[tokio::test]
    async fn log_mailer_always_delivers() {
        let to = Recipient {
            name: "alice".into(),
            email: "alice@x.test".into(),
        };
        let email = Email::Invitation {
            username: "alice".into(),
            activation_url: "u".into(),
        };
        let id = LogMailer.send(&to, &email).await.unwrap();
        assert!(!id.is_empty());
    }
}
