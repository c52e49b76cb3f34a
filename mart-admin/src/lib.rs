pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

use mart_core::access::AccessGate;
use services::{BackendClient, IdentityExchange, SessionProvider};
use std::sync::Arc;

/// Shared application state; cheap to clone into every request.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AccessGate>,
    pub sessions: Arc<dyn SessionProvider>,
    pub identity: Arc<dyn IdentityExchange>,
    pub backend: Arc<BackendClient>,
}

impl AppState {
    pub fn new(
        gate: AccessGate,
        sessions: Arc<dyn SessionProvider>,
        identity: Arc<dyn IdentityExchange>,
        backend: Arc<BackendClient>,
    ) -> Self {
        Self {
            gate: Arc::new(gate),
            sessions,
            identity,
            backend,
        }
    }
}
