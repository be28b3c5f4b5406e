use uuid::Uuid;

use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use serde_json::Value;

use crate::domain::RequiredText;
use crate::error::ValidationError;

/// Raw booking request as submitted by the front end.
/// NOTE: Every field is optional so that missing details are reported as a rejected submission
#[derive(Debug, Default, Clone)]
pub struct BookingSubmission {
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl BookingSubmission {
    /// Read a submission from a request body, whatever its declared content type.
    /// A body that isn't a JSON object yields an empty submission
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice::<Value>(body)
            .map(|value| Self::from(&value))
            .unwrap_or_default()
    }
}

impl From<&Value> for BookingSubmission {
    /// Only string values count as provided, anything else is treated as missing
    fn from(value: &Value) -> Self {
        let text = |field: &str| value.get(field).and_then(Value::as_str).map(String::from);

        Self {
            service: text("service"),
            date: text("date"),
            time: text("time"),
            name: text("name"),
            email: text("email"),
            phone: text("phone"),
        }
    }
}

/// Validated booking request, ready to be stored
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub service: RequiredText,
    pub date: RequiredText,
    pub time: RequiredText,
    pub name: RequiredText,
    pub email: RequiredText,
    pub phone: RequiredText,
}

impl TryFrom<BookingSubmission> for NewBooking {
    type Error = ValidationError;

    fn try_from(submission: BookingSubmission) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let mut require = |field: &'static str, value: Option<String>| {
            let parsed = value.and_then(|v| v.parse::<RequiredText>().ok());
            if parsed.is_none() {
                missing.push(field);
            }
            parsed
        };

        let service = require("service", submission.service);
        let date = require("date", submission.date);
        let time = require("time", submission.time);
        let name = require("name", submission.name);
        let email = require("email", submission.email);
        let phone = require("phone", submission.phone);

        match (service, date, time, name, email, phone) {
            (Some(service), Some(date), Some(time), Some(name), Some(email), Some(phone)) => {
                Ok(Self {
                    service,
                    date,
                    time,
                    name,
                    email,
                    phone,
                })
            }
            _ => Err(ValidationError::MissingDetails(missing)),
        }
    }
}

/// Stored booking record
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// ID of the booking, assigned by the store
    pub id: Uuid,
    pub service: String,
    pub date: String,
    pub time: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// New date/time for an existing booking
#[derive(Debug, Clone, Deserialize)]
pub struct Schedule {
    pub date: String,
    pub time: String,
}
