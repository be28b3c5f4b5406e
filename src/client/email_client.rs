use std::fmt;
use std::time::Duration;

use anyhow::Context;

use reqwest::header::HeaderName;
use reqwest::{Client, StatusCode};

use serde::Serialize;

use secrecy::{ExposeSecret, Secret};

use url::Url;

use crate::domain::EmailAddress;
use crate::error::DeliveryError;

/// Mailbox that booking emails are sent from, rendered as `"Name" <address>`
#[derive(Debug, Clone)]
pub struct SenderIdentity {
    address: EmailAddress,
    name: Option<String>,
}

impl SenderIdentity {
    pub fn new(address: EmailAddress, name: Option<&str>) -> Self {
        // Quotes and angle brackets would break the mailbox syntax
        let name = name
            .map(|name| name.replace(['"', '<', '>'], ""))
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        Self { address, name }
    }
}

impl fmt::Display for SenderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "\"{}\" <{}>", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Endpoint and credentials of the transactional email provider
#[derive(Debug, Clone)]
pub struct EmailApi {
    pub base_url: Url,
    /// Send endpoint, relative to `base_url`
    pub send_path: String,
    /// Request header carrying `token`
    pub token_header: String,
    pub token: Secret<String>,
    pub timeout: Duration,
}

/// A single outgoing message
#[derive(Debug, Clone)]
pub struct Email {
    pub to: EmailAddress,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    /// Provider-side category, e.g. to split confirmations from owner alerts in delivery stats
    pub tag: &'static str,
}

/// Delivers booking emails through the provider's REST API.
/// One request per message, no retries
#[derive(Debug)]
pub struct EmailClient {
    http: Client,
    sender: SenderIdentity,

    send_url: Url,
    token_header: HeaderName,
    token: Secret<String>,
}

impl EmailClient {
    pub fn new(sender: SenderIdentity, api: EmailApi) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(api.timeout)
            .build()
            .context("Failed to build http client")?;

        let send_url = api
            .base_url
            .join(&api.send_path)
            .with_context(|| format!("Invalid email send path `{}`", api.send_path))?;
        let token_header = HeaderName::from_bytes(api.token_header.as_bytes())
            .with_context(|| format!("Invalid email token header `{}`", api.token_header))?;

        Ok(Self {
            http,
            sender,
            send_url,
            token_header,
            token: api.token,
        })
    }

    #[tracing::instrument(
        name = "Deliver an email",
        skip(self, email),
        fields(to = %email.to, tag = email.tag)
    )]
    pub async fn deliver(&self, email: &Email) -> Result<(), DeliveryError> {
        let from = self.sender.to_string();
        let request = DeliveryRequest {
            from: &from,
            to: email.to.as_ref(),
            subject: &email.subject,
            html_body: &email.html_body,
            text_body: &email.text_body,
            tag: email.tag,
        };

        let res = self
            .http
            .post(self.send_url.clone())
            .header(self.token_header.clone(), self.token.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(DeliveryError::Unreachable)?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }

        tracing::debug!(%status, "Email API refused the message");
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                DeliveryError::Unauthorized(status.as_u16())
            }
            StatusCode::TOO_MANY_REQUESTS => DeliveryError::QuotaExceeded,
            _ => DeliveryError::Refused(status.as_u16()),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeliveryRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
    tag: &'a str,
}
