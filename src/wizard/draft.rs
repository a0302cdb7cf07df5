use chrono::{NaiveTime, Weekday};
use serde::Serialize;

use crate::api::Attachment;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessInfo {
    pub business_name: String,
    pub owner_name: String,
    pub email: String,
    pub phone: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHours {
    pub day: Weekday,
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub closed: bool,
}

impl DayHours {
    pub fn open(day: Weekday, open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            day,
            open,
            close,
            closed: false,
        }
    }

    pub fn closed(day: Weekday) -> Self {
        Self {
            day,
            open: NaiveTime::MIN,
            close: NaiveTime::MIN,
            closed: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceDetails {
    pub categories: Vec<String>,
    pub hours: Vec<DayHours>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Documents {
    pub business_license: Option<Attachment>,
    pub identity_proof: Option<Attachment>,
    pub food_safety_certificate: Option<Attachment>,
}

/// Everything entered across the four registration steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationDraft {
    pub business: BusinessInfo,
    pub address: Address,
    pub service: ServiceDetails,
    pub documents: Documents,
}
