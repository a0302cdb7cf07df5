use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use super::{IdToken, IdentityProvider, SessionCache};
use crate::api::ConsoleBackend;
use crate::error::{ApiError, AuthError};

/// Tokens expiring within this window are refreshed.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Vendor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Vendor => f.write_str("vendor"),
        }
    }
}

/// The verified identity of the signed-in principal.
///
/// Fetched from the backend once after sign-in and never modified afterwards;
/// the role comes from the backend's claim rather than from which console is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub vendor_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn { session: Session, token: IdToken },
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::SignedIn { session, .. } => Some(session),
            AuthState::SignedOut => None,
        }
    }
}

/// Process-wide authentication state.
///
/// Cheap to clone; every clone observes the same state. Consumers call
/// [`subscribe`](Self::subscribe) to be told about sign-in, sign-out and token refreshes.
#[derive(Clone)]
pub struct AuthContext {
    state: Arc<watch::Sender<AuthState>>,
    provider: Option<Arc<dyn IdentityProvider>>,
    cache: Option<SessionCache>,
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl AuthContext {
    pub fn new(provider: Option<Arc<dyn IdentityProvider>>, cache: Option<SessionCache>) -> Self {
        let (state, _) = watch::channel(AuthState::SignedOut);
        Self {
            state: Arc::new(state),
            provider,
            cache,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    /// The current bearer token, or `Unauthenticated` without touching the network.
    pub fn bearer(&self) -> Result<String, ApiError> {
        match &*self.state.borrow() {
            AuthState::SignedIn { token, .. } => Ok(token.token.clone()),
            AuthState::SignedOut => Err(ApiError::Unauthenticated),
        }
    }

    pub fn require_role(&self, role: Role) -> Result<Session, AuthError> {
        let session = self.session().ok_or(AuthError::Api(ApiError::Unauthenticated))?;
        if session.role != role {
            return Err(AuthError::WrongRole {
                expected: role.to_string(),
                actual: session.role.to_string(),
            });
        }
        Ok(session)
    }

    /// Signs in with email and password, then verifies the session with the backend.
    ///
    /// State only changes once the backend has confirmed a session with the
    /// expected role.
    #[instrument(skip(self, backend, password))]
    pub async fn sign_in(
        &self,
        backend: &dyn ConsoleBackend,
        email: &str,
        password: &str,
        expected: Role,
    ) -> Result<Session, AuthError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| AuthError::Provider("No identity provider configured".to_string()))?;

        let token = provider.sign_in_with_password(email, password).await?;
        let session = backend.fetch_session(&token.token).await?;
        if session.role != expected {
            warn!(role = %session.role, "Signed-in account has the wrong role");
            return Err(AuthError::WrongRole {
                expected: expected.to_string(),
                actual: session.role.to_string(),
            });
        }

        self.establish(session.clone(), token);
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(&session).await {
                warn!(error = %e, "Could not write session cache");
            }
        }
        info!(uid = %session.uid, role = %session.role, "Signed in");
        Ok(session)
    }

    pub(crate) fn establish(&self, session: Session, token: IdToken) {
        self.state.send_replace(AuthState::SignedIn { session, token });
    }

    /// Refreshes the id token if it expires soon. Returns whether a refresh happened.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<bool, AuthError> {
        let (uid, token) = match self.state() {
            AuthState::SignedIn { session, token } => (session.uid, token),
            AuthState::SignedOut => return Err(AuthError::Api(ApiError::Unauthenticated)),
        };
        if token.expires_at - Utc::now() > Duration::seconds(REFRESH_MARGIN_SECS) {
            return Ok(false);
        }
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| AuthError::Provider("No identity provider configured".to_string()))?;

        let fresh = provider.refresh(&token).await?;
        let mut replaced = false;
        self.state.send_modify(|state| {
            // Ignore the result if the user signed out or switched accounts meanwhile.
            if let AuthState::SignedIn { session, token } = state {
                if session.uid == uid {
                    *token = fresh;
                    replaced = true;
                }
            }
        });
        info!(replaced, "Token refreshed");
        Ok(replaced)
    }

    pub async fn sign_out(&self) {
        self.state.send_replace(AuthState::SignedOut);
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear().await {
                warn!(error = %e, "Could not clear session cache");
            }
        }
        info!("Signed out");
    }

    /// Last session written to the cache. A hint for the UI only; it never
    /// authorizes a request.
    pub async fn cached_session(&self) -> Option<Session> {
        match &self.cache {
            Some(cache) => cache.load().await,
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_framework::{session, token_expiring_in, FakeBackend, StaticIdentity};

    fn context(identity: StaticIdentity) -> AuthContext {
        AuthContext::new(Some(Arc::new(identity)), None)
    }

    #[tokio::test]
    async fn test_sign_in_verifies_role_with_backend() {
        let backend = FakeBackend::new().with_session(session("admin-1", Role::Admin));
        let auth = context(StaticIdentity::new("token-1"));
        let mut changes = auth.subscribe();

        let session = auth.sign_in(&backend, "ops@example.com", "pw", Role::Admin).await.unwrap();
        assert_eq!(session.uid, "admin-1");
        assert_eq!(auth.bearer(), Ok("token-1".to_string()));
        assert!(changes.has_changed().unwrap());
        assert!(changes.borrow_and_update().session().is_some());
    }

    #[tokio::test]
    async fn test_wrong_role_stays_signed_out() {
        let backend = FakeBackend::new().with_session(session("vendor-1", Role::Vendor));
        let auth = context(StaticIdentity::new("token-1"));

        let result = auth.sign_in(&backend, "pho@example.com", "pw", Role::Admin).await;
        assert_eq!(
            result,
            Err(AuthError::WrongRole {
                expected: "admin".to_string(),
                actual: "vendor".to_string()
            })
        );
        assert_eq!(auth.bearer(), Err(ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_refresh_only_when_close_to_expiry() {
        let auth = context(StaticIdentity::new("token-2"));
        auth.establish(session("admin-1", Role::Admin), token_expiring_in("token-1", 3600));
        assert_eq!(auth.refresh_token().await, Ok(false));
        assert_eq!(auth.bearer(), Ok("token-1".to_string()));

        auth.establish(session("admin-1", Role::Admin), token_expiring_in("token-1", 10));
        assert_eq!(auth.refresh_token().await, Ok(true));
        assert_eq!(auth.bearer(), Ok("token-2".to_string()));
        assert_eq!(auth.session().unwrap().uid, "admin-1");
    }

    #[tokio::test]
    async fn test_require_role_and_sign_out() {
        let auth = AuthContext::default();
        assert_eq!(auth.require_role(Role::Vendor), Err(AuthError::Api(ApiError::Unauthenticated)));

        auth.establish(session("vendor-1", Role::Vendor), token_expiring_in("t", 3600));
        assert!(auth.require_role(Role::Vendor).is_ok());
        assert!(matches!(auth.require_role(Role::Admin), Err(AuthError::WrongRole { .. })));

        auth.sign_out().await;
        assert!(auth.session().is_none());
    }
}
