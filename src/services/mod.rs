pub mod appointments;
pub mod auth;
pub mod availability;
pub mod booking_flow;
pub mod catalog;
pub mod metrics;
pub mod schedule;
pub mod scheduling;
