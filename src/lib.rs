// Library exports for binary tools and tests. Routes and middleware stay in
// the api binary; they lean on its AppState.
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
