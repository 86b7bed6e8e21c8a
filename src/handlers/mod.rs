pub mod admin;
pub mod health;
pub mod params;
pub mod session;
