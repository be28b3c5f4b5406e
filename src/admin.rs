use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::{AdminError, StoreError};
use crate::model::{Booking, Schedule};
use crate::repo::{with_timeout, BookingStore};

/// Administration of stored bookings.
/// Only existence is checked, there is no validation of the new date/time
#[derive(Clone)]
pub struct BookingAdmin {
    store: Arc<dyn BookingStore>,
    store_timeout: Duration,
}

impl BookingAdmin {
    pub fn new(store: Arc<dyn BookingStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// All bookings, newest first
    pub async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        with_timeout(self.store_timeout, self.store.list_all()).await
    }

    pub async fn reschedule(&self, id: Uuid, schedule: Schedule) -> Result<Booking, AdminError> {
        with_timeout(self.store_timeout, self.store.update_by_id(id, &schedule))
            .await?
            .ok_or(AdminError::NotFound(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AdminError> {
        let removed = with_timeout(self.store_timeout, self.store.delete_by_id(id)).await?;
        if !removed {
            return Err(AdminError::NotFound(id));
        }
        Ok(())
    }
}
