use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::payloads::{
    AnalyticsSummary, AvailabilityUpdate, BannerOrder, CategoryInput, ErrorBody, MenuItemInput,
    MultipartForm, OrderScope, OrderStatusUpdate, PlatformSettings, VendorStatusUpdate,
};
use super::ConsoleBackend;
use crate::auth::{AuthContext, Session};
use crate::domain::{
    Banner, Category, DocumentRef, MenuItem, Order, OrderStatus, Vendor, VendorStatus,
};
use crate::error::ApiError;

/// HTTP implementation of [`ConsoleBackend`].
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    auth: AuthContext,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, auth: AuthContext) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Transport(format!("Invalid base URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Transport(format!("Invalid base URL: {}", base_url)));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { http, base_url, auth })
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Appends percent-encoded path segments to the base URL.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        // Checked first so a signed-out caller never reaches the network.
        self.auth.bearer()?;
        if let Err(e) = self.auth.refresh_token().await {
            warn!(error = %e, "Token refresh failed, sending current token");
        }
        let token = self.auth.bearer()?;
        let url = self.endpoint(segments)?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Request failed");
            ApiError::Transport(e.to_string())
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = error_from_response(status.as_u16(), &body);
        warn!(status = status.as_u16(), error = %err, "Backend rejected request");
        Err(err)
    }

    async fn json<R: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<R, ApiError> {
        self.send(builder)
            .await?
            .json::<R>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send(builder).await.map(|_| ())
    }
}

/// Builds the error for a non-success response, preferring the message the
/// backend put in the body.
pub(crate) fn error_from_response(status: u16, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status));

    match status {
        401 => ApiError::Unauthenticated,
        403 => ApiError::Forbidden(message),
        _ => ApiError::Status { status, message },
    }
}

fn to_multipart(form: &MultipartForm) -> Result<multipart::Form, ApiError> {
    let mut body = multipart::Form::new();
    for (name, value) in &form.fields {
        body = body.text(name.clone(), value.clone());
    }
    for (name, attachment) in &form.files {
        let part = multipart::Part::bytes(attachment.bytes.clone())
            .file_name(attachment.file_name.clone())
            .mime_str(&attachment.content_type)
            .map_err(|e| ApiError::Transport(format!("Invalid content type for {}: {}", name, e)))?;
        body = body.part(name.clone(), part);
    }
    Ok(body)
}

#[async_trait]
impl ConsoleBackend for ApiClient {
    #[instrument(skip(self, id_token))]
    async fn fetch_session(&self, id_token: &str) -> Result<Session, ApiError> {
        debug!("Sending request");
        let url = self.endpoint(&["auth", "session"])?;
        self.json(self.http.get(url).bearer_auth(id_token)).await
    }

    #[instrument(skip(self))]
    async fn list_orders(&self, scope: &OrderScope) -> Result<Vec<Order>, ApiError> {
        debug!("Sending request");
        let builder = match scope {
            OrderScope::All => self.request(Method::GET, &["orders"]).await?,
            OrderScope::Vendor(vendor_id) => {
                self.request(Method::GET, &["vendors", vendor_id.as_str(), "orders"]).await?
            }
        };
        self.json(builder).await
    }

    #[instrument(skip(self))]
    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<(), ApiError> {
        debug!("Sending request");
        let builder = self
            .request(Method::PATCH, &["orders", id, "status"])
            .await?
            .json(&OrderStatusUpdate { status });
        self.empty(builder).await
    }

    #[instrument(skip(self))]
    async fn list_vendors(&self) -> Result<Vec<Vendor>, ApiError> {
        debug!("Sending request");
        self.json(self.request(Method::GET, &["vendors"]).await?).await
    }

    #[instrument(skip(self))]
    async fn update_vendor_status(
        &self,
        id: &str,
        status: VendorStatus,
        reason: Option<&str>,
    ) -> Result<(), ApiError> {
        debug!("Sending request");
        let builder = self
            .request(Method::PATCH, &["vendors", id, "status"])
            .await?
            .json(&VendorStatusUpdate { status, reason });
        self.empty(builder).await
    }

    #[instrument(skip(self))]
    async fn vendor_documents(&self, id: &str) -> Result<Vec<DocumentRef>, ApiError> {
        debug!("Sending request");
        self.json(self.request(Method::GET, &["vendors", id, "documents"]).await?).await
    }

    #[instrument(skip(self, form), fields(files = form.files.len()))]
    async fn register_vendor(&self, form: &MultipartForm) -> Result<(), ApiError> {
        debug!("Sending request");
        let builder = self
            .request(Method::POST, &["vendors", "register"])
            .await?
            .multipart(to_multipart(form)?);
        self.empty(builder).await
    }

    #[instrument(skip(self))]
    async fn list_menu_items(&self) -> Result<Vec<MenuItem>, ApiError> {
        debug!("Sending request");
        self.json(self.request(Method::GET, &["menu-items"]).await?).await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_menu_item(&self, input: &MenuItemInput) -> Result<MenuItem, ApiError> {
        debug!("Sending request");
        self.json(self.request(Method::POST, &["menu-items"]).await?.json(input)).await
    }

    #[instrument(skip(self, input))]
    async fn update_menu_item(
        &self,
        id: &str,
        input: &MenuItemInput,
    ) -> Result<MenuItem, ApiError> {
        debug!("Sending request");
        self.json(self.request(Method::PUT, &["menu-items", id]).await?.json(input)).await
    }

    #[instrument(skip(self))]
    async fn delete_menu_item(&self, id: &str) -> Result<(), ApiError> {
        debug!("Sending request");
        self.empty(self.request(Method::DELETE, &["menu-items", id]).await?).await
    }

    #[instrument(skip(self))]
    async fn set_menu_item_availability(&self, id: &str, available: bool) -> Result<(), ApiError> {
        debug!("Sending request");
        let builder = self
            .request(Method::PATCH, &["menu-items", id, "availability"])
            .await?
            .json(&AvailabilityUpdate { available });
        self.empty(builder).await
    }

    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        debug!("Sending request");
        self.json(self.request(Method::GET, &["categories"]).await?).await
    }

    #[instrument(skip(self))]
    async fn create_category(&self, name: &str) -> Result<Category, ApiError> {
        debug!("Sending request");
        self.json(self.request(Method::POST, &["categories"]).await?.json(&CategoryInput { name }))
            .await
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: &str) -> Result<(), ApiError> {
        debug!("Sending request");
        self.empty(self.request(Method::DELETE, &["categories", id]).await?).await
    }

    #[instrument(skip(self))]
    async fn list_banners(&self) -> Result<Vec<Banner>, ApiError> {
        debug!("Sending request");
        self.json(self.request(Method::GET, &["banners"]).await?).await
    }

    #[instrument(skip(self))]
    async fn save_banner_order(&self, ids: &[String]) -> Result<(), ApiError> {
        debug!("Sending request");
        let builder = self
            .request(Method::PUT, &["banners", "order"])
            .await?
            .json(&BannerOrder { ids });
        self.empty(builder).await
    }

    #[instrument(skip(self))]
    async fn analytics_summary(&self) -> Result<AnalyticsSummary, ApiError> {
        debug!("Sending request");
        self.json(self.request(Method::GET, &["analytics", "summary"]).await?).await
    }

    #[instrument(skip(self))]
    async fn settings(&self) -> Result<PlatformSettings, ApiError> {
        debug!("Sending request");
        self.json(self.request(Method::GET, &["settings"]).await?).await
    }

    #[instrument(skip(self, settings))]
    async fn update_settings(
        &self,
        settings: &PlatformSettings,
    ) -> Result<PlatformSettings, ApiError> {
        debug!("Sending request");
        self.json(self.request(Method::PUT, &["settings"]).await?.json(settings)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Attachment;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5), AuthContext::default()).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let api = client("https://api.example.com/v1");
        let url = api.endpoint(&["orders", "a b/c", "status"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/orders/a%20b%2Fc/status");

        let api = client("https://api.example.com/v1/");
        let url = api.endpoint(&["vendors"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/vendors");
    }

    #[test]
    fn test_rejects_non_base_url() {
        let timeout = Duration::from_secs(1);
        let result = ApiClient::new("mailto:ops@example.com", timeout, AuthContext::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_from_response(422, r#"{"message":"Price must be positive"}"#),
            ApiError::Status {
                status: 422,
                message: "Price must be positive".to_string()
            }
        );
        assert_eq!(
            error_from_response(500, r#"{"error":"Database unavailable"}"#),
            ApiError::Status {
                status: 500,
                message: "Database unavailable".to_string()
            }
        );
        assert_eq!(
            error_from_response(502, "<html>Bad Gateway</html>"),
            ApiError::Status {
                status: 502,
                message: "Request failed with status 502".to_string()
            }
        );
        assert_eq!(
            error_from_response(403, r#"{"message":"Admins only"}"#),
            ApiError::Forbidden("Admins only".to_string())
        );
        assert_eq!(error_from_response(401, ""), ApiError::Unauthenticated);
    }

    #[tokio::test]
    async fn test_signed_out_call_fails_before_network() {
        // Port 9 (discard) would fail at the transport layer; the auth check fires first.
        let api = client("http://127.0.0.1:9");
        assert_eq!(api.list_vendors().await, Err(ApiError::Unauthenticated));
        assert_eq!(
            api.update_order_status("o1", OrderStatus::Accepted).await,
            Err(ApiError::Unauthenticated)
        );
    }

    #[test]
    fn test_multipart_rejects_bad_content_type() {
        let mut form = MultipartForm::default();
        form.text("businessName", "Pho Place")
            .file("businessLicense", Attachment::new("licence.pdf", "not a mime", vec![1, 2, 3]));
        assert!(to_multipart(&form).is_err());

        let mut form = MultipartForm::default();
        form.file("businessLicense", Attachment::new("licence.pdf", "application/pdf", vec![1]));
        assert!(to_multipart(&form).is_ok());
    }
}
