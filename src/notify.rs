use std::fmt;

use serde::Deserialize;

use crate::client::{Email, EmailClient};
use crate::domain::EmailAddress;
use crate::error::NotifyError;
use crate::model::Booking;

/// Sends notifications about stored bookings.
/// A single attempt is made per call, failures are reported to the caller to log
#[async_trait::async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn send(&self, booking: &Booking) -> Result<(), NotifyError>;
}

/// Who is emailed about a new booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientPolicy {
    /// The address supplied with the booking
    #[default]
    Customer,
    /// The configured owner address
    Owner,
    Both,
}

impl RecipientPolicy {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Customer => "customer",
            Self::Owner => "owner",
            Self::Both => "both",
        }
    }

    fn notifies_customer(self) -> bool {
        matches!(self, Self::Customer | Self::Both)
    }

    fn notifies_owner(self) -> bool {
        matches!(self, Self::Owner | Self::Both)
    }
}

impl fmt::Display for RecipientPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Email notifications over the email REST API
#[derive(Debug)]
pub struct EmailNotifier {
    client: EmailClient,
    policy: RecipientPolicy,
    owner: Option<EmailAddress>,
}

impl EmailNotifier {
    pub fn new(
        client: EmailClient,
        policy: RecipientPolicy,
        owner: Option<EmailAddress>,
    ) -> anyhow::Result<Self> {
        if policy.notifies_owner() && owner.is_none() {
            anyhow::bail!(
                "Recipient policy `{}` requires an owner email address",
                policy
            );
        }

        Ok(Self {
            client,
            policy,
            owner,
        })
    }
}

#[async_trait::async_trait]
impl BookingNotifier for EmailNotifier {
    #[tracing::instrument(
        name = "Email booking notifications",
        skip(self, booking),
        fields(booking.id = %booking.id)
    )]
    async fn send(&self, booking: &Booking) -> Result<(), NotifyError> {
        let mut first_error = None;

        if self.policy.notifies_customer() {
            let result = match booking.email.parse::<EmailAddress>() {
                Ok(recipient) => self
                    .client
                    .deliver(&customer_confirmation(recipient, booking))
                    .await
                    .map_err(NotifyError::from),
                Err(msg) => Err(NotifyError::InvalidRecipient(msg)),
            };
            if let Err(error) = result {
                tracing::debug!(%error, "Customer confirmation not sent");
                first_error.get_or_insert(error);
            }
        }

        if let (true, Some(owner)) = (self.policy.notifies_owner(), &self.owner) {
            let result = self.client.deliver(&owner_alert(owner.clone(), booking)).await;
            if let Err(error) = result {
                tracing::debug!(%error, "Owner alert not sent");
                first_error.get_or_insert(error.into());
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn customer_confirmation(recipient: EmailAddress, booking: &Booking) -> Email {
    let subject = "Booking Confirmed".to_string();
    let text_body = format!(
        "Your booking is confirmed!\n\nService: {}\nDate: {}\nTime: {}\n\nThank you for booking with us.",
        booking.service, booking.date, booking.time
    );
    let html_body = format!(
        "<h1>Your booking is confirmed!</h1><p>Service: {}<br>Date: {}<br>Time: {}</p><p>Thank you for booking with us.</p>",
        escape_html(&booking.service),
        escape_html(&booking.date),
        escape_html(&booking.time)
    );

    Email {
        to: recipient,
        subject,
        html_body,
        text_body,
        tag: "booking-confirmation",
    }
}

fn owner_alert(recipient: EmailAddress, booking: &Booking) -> Email {
    let subject = format!("New booking: {}", booking.service);
    let text_body = format!(
        "A new booking was received.\n\nService: {}\nDate: {}\nTime: {}\nName: {}\nEmail: {}\nPhone: {}",
        booking.service, booking.date, booking.time, booking.name, booking.email, booking.phone
    );
    let html_body = format!(
        "<h1>A new booking was received</h1><ul><li>Service: {}</li><li>Date: {}</li><li>Time: {}</li><li>Name: {}</li><li>Email: {}</li><li>Phone: {}</li></ul>",
        escape_html(&booking.service),
        escape_html(&booking.date),
        escape_html(&booking.time),
        escape_html(&booking.name),
        escape_html(&booking.email),
        escape_html(&booking.phone)
    );

    Email {
        to: recipient,
        subject,
        html_body,
        text_body,
        tag: "booking-alert",
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
