mod bookings;

pub use bookings::*;
