pub mod backend_client;
pub mod identity;
pub mod metrics;
pub mod session;

pub use backend_client::{BackendClient, BackendError};
pub use identity::{ExchangeError, IdentityExchange, SignedIdentity};
pub use session::{JwtSessionProvider, SessionError, SessionProvider};
