use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collection::{Entity, HasStatus};
use crate::query::{Queryable, SortValue};

/// Approval state of a vendor account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorStatus {
    Pending,
    Approved,
    Rejected,
}

impl VendorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::Pending => "pending",
            VendorStatus::Approved => "approved",
            VendorStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document uploaded during vendor registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub status: VendorStatus,
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl Vendor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            status: VendorStatus::Pending,
            registered_at: Utc::now(),
            documents: Vec::new(),
            rejection_reason: None,
        }
    }
}

impl Entity for Vendor {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}

impl HasStatus for Vendor {
    type Status = VendorStatus;

    fn status(&self) -> VendorStatus {
        self.status
    }

    fn set_status(&mut self, status: VendorStatus) {
        self.status = status;
    }
}

impl Queryable for Vendor {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str()]
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue<'_>> {
        match key {
            "name" => Some(SortValue::Text(&self.name)),
            "email" => Some(SortValue::Text(&self.email)),
            "status" => Some(SortValue::Text(self.status.as_str())),
            "registered_at" => Some(SortValue::Time(self.registered_at)),
            _ => None,
        }
    }
}
