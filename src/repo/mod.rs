use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;

mod bookings;
mod memory;

pub use bookings::{BookingStore, PgBookingStore};
pub use memory::InMemoryBookingStore;

/// Bound a store call, reporting expiry as a store failure
pub async fn with_timeout<T, F>(timeout: Duration, future: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| StoreError::Timeout(timeout))?
}
