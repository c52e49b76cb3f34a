pub mod access;
pub mod metrics;

pub use access::access_gate_middleware;
pub use metrics::metrics_middleware;
