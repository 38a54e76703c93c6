pub mod availability;
pub mod scheduling;
pub mod slots;
