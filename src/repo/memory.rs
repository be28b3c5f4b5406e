use chrono::Utc;

use tokio::sync::RwLock;

use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Booking, NewBooking, Schedule};

use super::BookingStore;

/// Process-local booking store.
/// Records are kept in creation order; nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    bookings: RwLock<Vec<Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BookingStore for InMemoryBookingStore {
    #[tracing::instrument(name = "Insert booking (in memory)", skip(self))]
    async fn create(&self, new_booking: &NewBooking) -> Result<Booking, StoreError> {
        let booking = Booking {
            id: Uuid::new_v4(),
            service: new_booking.service.to_string(),
            date: new_booking.date.to_string(),
            time: new_booking.time.to_string(),
            name: new_booking.name.to_string(),
            email: new_booking.email.to_string(),
            phone: new_booking.phone.to_string(),
            created_at: Utc::now(),
        };
        self.bookings.write().await.push(booking.clone());

        Ok(booking)
    }

    async fn list_all(&self) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().rev().cloned().collect())
    }

    #[tracing::instrument(name = "Reschedule a booking by id (in memory)", skip(self))]
    async fn update_by_id(
        &self,
        id: Uuid,
        schedule: &Schedule,
    ) -> Result<Option<Booking>, StoreError> {
        let mut bookings = self.bookings.write().await;
        let updated = bookings.iter_mut().find(|b| b.id == id).map(|booking| {
            booking.date = schedule.date.clone();
            booking.time = schedule.time.clone();
            booking.clone()
        });

        Ok(updated)
    }

    #[tracing::instrument(name = "Delete a booking by id (in memory)", skip(self))]
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut bookings = self.bookings.write().await;
        let before = bookings.len();
        bookings.retain(|b| b.id != id);

        Ok(bookings.len() < before)
    }
}
