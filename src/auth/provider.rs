use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::AuthError;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
const DEFAULT_TTL_SECS: i64 = 3600;

/// An identity token issued by the identity provider.
#[derive(Clone, PartialEq)]
pub struct IdToken {
    pub token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl IdToken {
    pub fn new(token: impl Into<String>, refresh_token: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            token: token.into(),
            refresh_token: refresh_token.into(),
            expires_at: Utc::now() + Duration::seconds(ttl_secs),
        }
    }
}

impl fmt::Debug for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Third-party identity provider issuing the bearer tokens the backend accepts.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdToken, AuthError>;

    async fn refresh(&self, token: &IdToken) -> Result<IdToken, AuthError>;
}

/// Identity Toolkit REST client (Firebase Authentication).
pub struct FirebaseIdentity {
    http: reqwest::Client,
    api_key: String,
    identity_url: String,
    token_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    message: String,
}

impl FirebaseIdentity {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoints(api_key, IDENTITY_TOOLKIT_URL, SECURE_TOKEN_URL)
    }

    /// Points at non-default endpoints, e.g. a local auth emulator.
    pub fn with_endpoints(api_key: impl Into<String>, identity_url: &str, token_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            identity_url: identity_url.trim_end_matches('/').to_string(),
            token_url: token_url.trim_end_matches('/').to_string(),
        }
    }

    async fn read<R: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<R, AuthError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| AuthError::Provider(e.to_string()))?;
        if !status.is_success() {
            let code = serde_json::from_str::<ProviderErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("status {}", status.as_u16()));
            warn!(code = %code, "Identity provider rejected request");
            return Err(AuthError::Provider(friendly_error(&code)));
        }
        serde_json::from_str(&body)
            .map_err(|e| AuthError::Provider(format!("Invalid provider response: {}", e)))
    }
}

fn ttl(expires_in: Option<&str>) -> i64 {
    expires_in.and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_TTL_SECS)
}

/// Maps provider error codes to messages fit for a notification.
pub fn friendly_error(code: &str) -> String {
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password".to_string()
        }
        "USER_DISABLED" => "This account has been disabled".to_string(),
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" => {
            "Session expired, please sign in again".to_string()
        }
        c if c.starts_with("TOO_MANY_ATTEMPTS_TRY_LATER") => {
            "Too many attempts, try again later".to_string()
        }
        other => other.to_string(),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdToken, AuthError> {
        debug!("Sending request");
        let url = format!("{}/accounts:signInWithPassword", self.identity_url);
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let body: SignInResponse = Self::read(response).await?;
        Ok(IdToken::new(body.id_token, body.refresh_token, ttl(body.expires_in.as_deref())))
    }

    #[instrument(skip(self, token))]
    async fn refresh(&self, token: &IdToken) -> Result<IdToken, AuthError> {
        debug!("Sending request");
        let url = format!("{}/token", self.token_url);
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", token.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let body: RefreshResponse = Self::read(response).await?;
        Ok(IdToken::new(body.id_token, body.refresh_token, ttl(body.expires_in.as_deref())))
    }
}
