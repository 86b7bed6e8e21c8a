pub mod config;

pub use config::{AdminConfig, AppConfig, CredentialsConfig, ServerConfig, SessionSettings};
