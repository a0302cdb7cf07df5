use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collection::{Entity, HasStatus};
use crate::query::{Queryable, SortValue};

/// Availability of a menu item, treated as its status so toggles go through
/// the same optimistic path as order and vendor transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Unavailable => "unavailable",
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl From<bool> for Availability {
    fn from(available: bool) -> Self {
        if available {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category_id: String,
    pub available: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub preparation_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl MenuItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        category_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            category_id: category_id.into(),
            available: true,
            tags: Vec::new(),
            preparation_minutes: 0,
            image_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub item_count: u32,
}

impl Entity for MenuItem {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}

impl HasStatus for MenuItem {
    type Status = Availability;

    fn status(&self) -> Availability {
        Availability::from(self.available)
    }

    fn set_status(&mut self, status: Availability) {
        self.available = status.is_available();
    }
}

impl Entity for Category {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}

impl Queryable for MenuItem {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = vec![self.name.as_str(), self.description.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "category" => Some(self.category_id.clone()),
            "availability" => Some(Availability::from(self.available).as_str().to_string()),
            _ => None,
        }
    }

    fn sort_value(&self, key: &str) -> Option<SortValue<'_>> {
        match key {
            "name" => Some(SortValue::Text(&self.name)),
            "price" => Some(SortValue::Number(self.price)),
            "preparation_minutes" => Some(SortValue::Number(f64::from(self.preparation_minutes))),
            _ => None,
        }
    }
}

impl Queryable for Category {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }

    fn filter_value(&self, _field: &str) -> Option<String> {
        None
    }

    fn sort_value(&self, key: &str) -> Option<SortValue<'_>> {
        match key {
            "name" => Some(SortValue::Text(&self.name)),
            "item_count" => Some(SortValue::Number(f64::from(self.item_count))),
            _ => None,
        }
    }
}
