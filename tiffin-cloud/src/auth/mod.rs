//! Authentication: session tokens issued after a login code verifies

pub mod token;

pub use token::{DEFAULT_SESSION_TTL_HOURS, SessionClaims, SessionError, SessionIssuer};
