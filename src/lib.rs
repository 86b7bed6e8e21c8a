// Library exports for the binary and integration tests
pub mod app;
pub mod audit;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod models;
pub mod session;
pub mod token;
