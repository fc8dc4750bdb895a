//! Blog payloads and the `{status, data, error}` envelope used by `/api/blogs`

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::errors::{ClientError, Result};

/// Summary row returned by `GET /api/blogs/lists`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlogListItem {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub saying: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date_time: String,
}

/// Full post, including the markdown body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlogDetail {
    #[serde(flatten)]
    pub item: BlogListItem,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filepath: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

/// Response envelope; `status == 0` means success
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: i32,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    /// Unwrap the envelope, turning a failure status into [`ClientError::Api`]
    pub fn into_result(self, fallback: &str) -> Result<Option<T>> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(ClientError::Api(
                self.error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

/// `data` payload of a successful add
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddedBlog {
    pub filename: String,
}

/// Editable metadata sent as query parameters on add / update-info
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogMeta {
    pub title: String,
    pub categories: String,
    pub tags: Vec<String>,
    pub saying: String,
}

impl BlogMeta {
    /// Pre-fill from an existing list entry so callers can change single fields
    pub fn from_item(item: &BlogListItem) -> Self {
        Self {
            title: item.title.clone(),
            categories: item.categories.clone(),
            tags: item.tags.clone(),
            saying: item.saying.clone(),
        }
    }
}

/// Outcome of a mutating blog call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpOutcome {
    pub success: bool,
    pub message: String,
    pub filename: Option<String>,
}

impl OpOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            filename: None,
        }
    }
}

/// Backend address of a post: `/{year}/{month}/{day}/{filename}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlogKey {
    pub year: String,
    pub month: String,
    pub day: String,
    pub filename: String,
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

impl BlogKey {
    pub fn new(
        year: impl Into<String>,
        month: impl Into<String>,
        day: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            year: year.into(),
            month: month.into(),
            day: day.into(),
            filename: filename.into(),
        }
    }

    /// Derive the key from a list entry's `dateTime` and `filename`
    pub fn from_item(item: &BlogListItem) -> Result<Self> {
        Self::from_date_time(&item.date_time, &item.filename)
    }

    pub fn from_date_time(date_time: &str, filename: &str) -> Result<Self> {
        let date = parse_date(date_time.trim()).ok_or_else(|| {
            ClientError::Parse(format!("unrecognised blog date: {:?}", date_time))
        })?;
        Ok(Self {
            year: format!("{:04}", date.year()),
            month: format!("{:02}", date.month()),
            day: format!("{:02}", date.day()),
            filename: filename.to_string(),
        })
    }
}

impl fmt::Display for BlogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.year, self.month, self.day, self.filename)
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Treat JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
