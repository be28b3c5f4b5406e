use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use tokio::task::JoinHandle;

use tracing::Instrument;

use crate::error::NotifyError;
use crate::model::{Booking, BookingSubmission, NewBooking};
use crate::notify::BookingNotifier;
use crate::repo::{with_timeout, BookingStore};

/// Client-facing reason for a storage failure
pub const BOOKING_FAILED: &str = "Booking failed";

/// Result of a booking submission, decided before any notification is attempted
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The booking was stored
    Accepted(Booking),
    /// The submission was missing details, nothing was stored
    Rejected(String),
    /// The store failed, the cause is logged only
    Failed,
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(reason) => Some(reason),
            Self::Failed => Some(BOOKING_FAILED),
        }
    }
}

/// Response body of a booking submission
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&SubmitOutcome> for SubmitResponse {
    fn from(outcome: &SubmitOutcome) -> Self {
        Self {
            accepted: outcome.is_accepted(),
            reason: outcome.reason().map(String::from),
        }
    }
}

/// Validates, stores and notifies about booking submissions
#[derive(Clone)]
pub struct BookingWorkflow {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn BookingNotifier>,
    store_timeout: Duration,
    notify_timeout: Duration,
}

impl BookingWorkflow {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn BookingNotifier>,
        store_timeout: Duration,
        notify_timeout: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            store_timeout,
            notify_timeout,
        }
    }

    /// Handle a submission.
    ///
    /// The outcome depends only on validation and persistence. Once a booking is stored the
    /// outcome is fixed and notification runs as a detached task that can't change it.
    #[tracing::instrument(name = "Submit a booking", skip(self, submission))]
    pub async fn submit(&self, submission: BookingSubmission) -> SubmitOutcome {
        let new_booking = match NewBooking::try_from(submission) {
            Ok(new_booking) => new_booking,
            Err(error) => {
                tracing::info!(?error, "Rejected booking submission");
                return SubmitOutcome::Rejected(error.to_string());
            }
        };

        let booking = match with_timeout(self.store_timeout, self.store.create(&new_booking)).await
        {
            Ok(booking) => booking,
            Err(error) => {
                tracing::error!(error.cause_chain = ?error, "Failed to store booking");
                return SubmitOutcome::Failed;
            }
        };
        tracing::info!(booking.id = %booking.id, "Booking stored");

        let outcome = SubmitOutcome::Accepted(booking.clone());
        // Detached: the handle is dropped, the task keeps running
        drop(self.dispatch_notification(booking));
        outcome
    }

    fn dispatch_notification(&self, booking: Booking) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        let timeout = self.notify_timeout;
        let span = tracing::info_span!("Notify about a booking", booking.id = %booking.id);

        tokio::spawn(
            async move {
                let result = tokio::time::timeout(timeout, notifier.send(&booking))
                    .await
                    .unwrap_or(Err(NotifyError::Timeout(timeout)));

                // The notification outcome is only ever logged
                match result {
                    Ok(()) => tracing::info!("Booking notification sent"),
                    Err(error) => tracing::warn!(
                        error.cause_chain = ?error,
                        "Booking notification failed, booking kept"
                    ),
                }
            }
            .instrument(span),
        )
    }
}
