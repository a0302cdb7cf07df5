//! Authentication: identity provider sign-in, the verified session and the
//! process-wide auth context every API call reads its bearer token from.

mod cache;
mod provider;
mod session;

pub use cache::SessionCache;
pub use provider::{friendly_error, FirebaseIdentity, IdToken, IdentityProvider};
pub use session::{AuthContext, AuthState, Role, Session};
