//! Authentication.
//!
//! Password digests, user registration, session tokens and the identity
//! resolver used by every authenticated endpoint.

mod identity;
mod password;
mod registration;
mod session;

pub use identity::{parse_basic_credentials, AuthError, BasicCredentials, IdentityResolver};
pub use password::{hash_password, verify_password};
pub use registration::{register, RegistrationError, RegistrationRequest};
pub use session::{session_key, SessionStore, SESSION_TTL_SECS};
