use uuid::Uuid;

use sqlx::PgPool;

use crate::error::StoreError;
use crate::model::{Booking, NewBooking, Schedule};

/// Booking store trait, implemented for each persistence backend.
/// NOTE: Shared by the workflow and the administration API, and swapped for doubles in tests
/// TODO: Swap async-trait for std async traits once `dyn` dispatch of async fns is stable
#[async_trait::async_trait]
pub trait BookingStore: Send + Sync {
    /// Persist a new booking, assigning it a fresh ID
    async fn create(&self, new_booking: &NewBooking) -> Result<Booking, StoreError>;

    /// Fetch every booking, newest first
    async fn list_all(&self) -> Result<Vec<Booking>, StoreError>;

    /// Replace the date and time of a booking, `None` if no booking has that ID
    async fn update_by_id(
        &self,
        id: Uuid,
        schedule: &Schedule,
    ) -> Result<Option<Booking>, StoreError>;

    /// Remove a booking, returning whether a record was removed
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Postgres Booking Store
#[derive(Debug, Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BookingStore for PgBookingStore {
    #[tracing::instrument(name = "Insert booking", skip(self))]
    async fn create(&self, new_booking: &NewBooking) -> Result<Booking, StoreError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"insert into bookings(service, "date", "time", name, email, phone)
            values ($1, $2, $3, $4, $5, $6)
            returning id, service, "date", "time", name, email, phone, created_at"#,
        )
        .bind(new_booking.service.as_ref())
        .bind(new_booking.date.as_ref())
        .bind(new_booking.time.as_ref())
        .bind(new_booking.name.as_ref())
        .bind(new_booking.email.as_ref())
        .bind(new_booking.phone.as_ref())
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    #[tracing::instrument(name = "Fetch all bookings", skip(self))]
    async fn list_all(&self) -> Result<Vec<Booking>, StoreError> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"select id, service, "date", "time", name, email, phone, created_at
            from bookings order by seq desc"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    #[tracing::instrument(name = "Reschedule a booking by id", skip(self))]
    async fn update_by_id(
        &self,
        id: Uuid,
        schedule: &Schedule,
    ) -> Result<Option<Booking>, StoreError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"update bookings set "date"=$2, "time"=$3 where id=$1
            returning id, service, "date", "time", name, email, phone, created_at"#,
        )
        .bind(id)
        .bind(&schedule.date)
        .bind(&schedule.time)
        .fetch_optional(&self.pool)
        .await?;

        Ok(booking)
    }

    #[tracing::instrument(name = "Delete a booking by id", skip(self))]
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("delete from bookings where id=$1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
