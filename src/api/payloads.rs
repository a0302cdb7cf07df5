use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{OrderStatus, VendorStatus};

#[derive(Debug, Serialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize)]
pub struct VendorStatusUpdate<'a> {
    pub status: VendorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityUpdate {
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct BannerOrder<'a> {
    pub ids: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct CategoryInput<'a> {
    pub name: &'a str,
}

/// Fields accepted when creating or editing a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemInput {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category_id: String,
    pub available: bool,
    pub tags: Vec<String>,
    pub preparation_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_orders: u64,
    pub total_revenue: f64,
    pub active_vendors: u64,
    pub pending_vendors: u64,
    #[serde(default)]
    pub orders_by_status: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSettings {
    pub commission_rate: f64,
    pub delivery_fee: f64,
    pub minimum_order: f64,
    pub support_email: String,
    #[serde(default)]
    pub maintenance_mode: bool,
}

/// Which orders a console may list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderScope {
    All,
    Vendor(String),
}

/// A binary file attached to a multipart request.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Text fields plus named file parts, sent as `multipart/form-data`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<(String, Attachment)>,
}

impl MultipartForm {
    pub fn text(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(&mut self, name: impl Into<String>, attachment: Attachment) -> &mut Self {
        self.files.push((name.into(), attachment));
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Error body shapes the backend is known to return.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
    pub error: Option<String>,
}
