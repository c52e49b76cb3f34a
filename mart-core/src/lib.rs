//! mart-core: shared infrastructure for the NEXT MART admin services.
pub mod access;
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use serde;
pub use serde_json;
pub use tracing;
pub use validator;
