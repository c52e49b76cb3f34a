//! Route-level role-based access control.

pub mod gate;
pub mod policy;
pub mod role;

pub use gate::{AccessGate, Decision, GatePaths, PathConfigError, SessionClaim, RETURN_TARGET_PARAM};
pub use policy::{PolicyEntry, PolicyError, RoutePolicy};
pub use role::Role;
