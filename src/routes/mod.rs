pub mod appointments;
pub mod auth;
pub mod booking;
pub mod health;
pub mod metrics;
pub mod schedule;
pub mod services;
