//! REST backend access.
//!
//! Boards talk to the backend only through [`ConsoleBackend`], implemented over
//! HTTP by [`ApiClient`]. Every call is authenticated with the current bearer
//! token; without a signed-in session calls fail with
//! [`ApiError::Unauthenticated`] before any request is sent.

mod client;
mod payloads;

use async_trait::async_trait;

use crate::auth::Session;
use crate::domain::{
    Banner, Category, DocumentRef, MenuItem, Order, OrderStatus, Vendor, VendorStatus,
};
use crate::error::ApiError;

pub use client::ApiClient;
pub use payloads::*;

#[async_trait]
pub trait ConsoleBackend: Send + Sync {
    /// Resolves the verified session for a freshly issued identity token.
    async fn fetch_session(&self, id_token: &str) -> Result<Session, ApiError>;

    async fn list_orders(&self, scope: &OrderScope) -> Result<Vec<Order>, ApiError>;
    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<(), ApiError>;

    async fn list_vendors(&self) -> Result<Vec<Vendor>, ApiError>;
    async fn update_vendor_status(
        &self,
        id: &str,
        status: VendorStatus,
        reason: Option<&str>,
    ) -> Result<(), ApiError>;
    async fn vendor_documents(&self, id: &str) -> Result<Vec<DocumentRef>, ApiError>;
    async fn register_vendor(&self, form: &MultipartForm) -> Result<(), ApiError>;

    async fn list_menu_items(&self) -> Result<Vec<MenuItem>, ApiError>;
    async fn create_menu_item(&self, input: &MenuItemInput) -> Result<MenuItem, ApiError>;
    async fn update_menu_item(
        &self,
        id: &str,
        input: &MenuItemInput,
    ) -> Result<MenuItem, ApiError>;
    async fn delete_menu_item(&self, id: &str) -> Result<(), ApiError>;
    async fn set_menu_item_availability(&self, id: &str, available: bool) -> Result<(), ApiError>;

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;
    async fn create_category(&self, name: &str) -> Result<Category, ApiError>;
    async fn delete_category(&self, id: &str) -> Result<(), ApiError>;

    async fn list_banners(&self) -> Result<Vec<Banner>, ApiError>;
    async fn save_banner_order(&self, ids: &[String]) -> Result<(), ApiError>;

    async fn analytics_summary(&self) -> Result<AnalyticsSummary, ApiError>;
    async fn settings(&self) -> Result<PlatformSettings, ApiError>;
    async fn update_settings(
        &self,
        settings: &PlatformSettings,
    ) -> Result<PlatformSettings, ApiError>;
}
