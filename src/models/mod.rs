pub mod appointment;
pub mod auth;
pub mod owner;
pub mod schedule;
pub mod service;
