use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copies_total: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copies_available: Option<i32>,
    #[serde(default, skip_serializing)]
    pub available: bool,
}

impl Book {
    /// Whether at least one copy can be borrowed right now.
    pub fn is_available(&self) -> bool {
        self.available || self.copies_available.unwrap_or(0) > 0
    }
}

/// Optional filters for listing and searching the catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilters {
    pub category: Option<String>,
    pub author: Option<String>,
    pub available: Option<bool>,
}

impl BookFilters {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.author.is_none() && self.available.is_none()
    }
}
