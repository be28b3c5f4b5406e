/// Administration of stored bookings
pub mod bookings;
/// Booking submissions from the front end
pub mod submissions;
