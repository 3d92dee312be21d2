pub mod core;
pub mod payments;
pub mod statuses;
