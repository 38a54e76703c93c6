pub mod booking;
pub mod car;
pub mod customer;

pub use booking::{Booking, BookingRequest};
pub use car::Car;
pub use customer::Customer;
