use serde::{Deserialize, Serialize};

use crate::collection::{Entity, Positioned};

/// A promotional banner shown on the customer app home screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub position: u32,
}

impl Banner {
    pub fn new(id: impl Into<String>, title: impl Into<String>, position: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: String::new(),
            position,
        }
    }
}

impl Entity for Banner {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }
}

impl Positioned for Banner {
    fn set_position(&mut self, position: usize) {
        self.position = u32::try_from(position).unwrap_or(u32::MAX);
    }
}
