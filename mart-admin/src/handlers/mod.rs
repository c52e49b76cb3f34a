pub mod app;
pub mod auth;
pub mod dashboard;
pub mod deliveries;
pub mod error;
pub mod inventory;
pub mod layout;
pub mod metrics;
pub mod products;
pub mod settings;
