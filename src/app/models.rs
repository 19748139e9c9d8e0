//! Data models for newsdesk
//!
//! This module defines the read-only article projection consumed by the data
//! access layer. Wire quirks (legacy category strings, raw markup bodies) are
//! resolved here, at the deserialization boundary, so nothing downstream has
//! to branch on the shape of a field.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Colour given to categories that arrive as a bare name
pub const DEFAULT_CATEGORY_COLOR: &str = "#FF1001";

/// Editorial status of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Review,
    Published,
    Archived,
}

impl ArticleStatus {
    /// Wire representation used in filters
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Review => "review",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category embedded in an article row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_color() -> String {
    DEFAULT_CATEGORY_COLOR.to_string()
}

impl CategoryRef {
    /// Build a category from a bare display name, as older rows store it
    pub fn from_name(name: &str) -> Self {
        let slug = slugify(name);
        Self {
            id: slug.clone(),
            name: name.trim().to_string(),
            slug,
            color: default_color(),
            description: None,
        }
    }
}

/// Normalized category of an article
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ArticleCategory {
    Categorized(CategoryRef),
    #[default]
    Uncategorized,
}

impl ArticleCategory {
    /// Slug of the category, if any
    pub fn slug(&self) -> Option<&str> {
        match self {
            Self::Categorized(category) => Some(&category.slug),
            Self::Uncategorized => None,
        }
    }

    /// Display name, "Uncategorized" when absent
    pub fn name(&self) -> &str {
        match self {
            Self::Categorized(category) => &category.name,
            Self::Uncategorized => "Uncategorized",
        }
    }

    pub fn record(&self) -> Option<&CategoryRef> {
        match self {
            Self::Categorized(category) => Some(category),
            Self::Uncategorized => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireCategory {
    Record(CategoryRef),
    Name(String),
}

impl<'de> Deserialize<'de> for ArticleCategory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = Option::<WireCategory>::deserialize(deserializer)?;
        Ok(match wire {
            Some(WireCategory::Record(category)) => Self::Categorized(category),
            Some(WireCategory::Name(name)) if !name.trim().is_empty() => {
                Self::Categorized(CategoryRef::from_name(&name))
            }
            _ => Self::Uncategorized,
        })
    }
}

impl Serialize for ArticleCategory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.record().serialize(serializer)
    }
}

/// Article body. Never interpreted by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleContent {
    /// Legacy raw markup
    Markup(String),
    /// Structured rich-text document tree
    Document(serde_json::Value),
}

impl Default for ArticleContent {
    fn default() -> Self {
        Self::Document(serde_json::Value::Null)
    }
}

/// Article as seen by readers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: ArticleContent,
    #[serde(default)]
    pub cover_image: Option<String>,
    pub status: ArticleStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub category: ArticleCategory,
}

impl Article {
    /// Timestamp used for ordering: publication time, or creation time for
    /// articles that were never published
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }

    pub fn is_published(&self) -> bool {
        self.status == ArticleStatus::Published
    }

    /// Cover image, ignoring empty strings left behind by the editor
    pub fn cover_url(&self) -> Option<&str> {
        self.cover_image
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Newest-first comparison
    pub fn newest_first(a: &Article, b: &Article) -> Ordering {
        b.sort_key().cmp(&a.sort_key())
    }
}

/// Row returned by the trending ranking procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedId {
    pub id: String,
}

/// Object stored in the media bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaObject {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Lowercase, hyphen-separated slug of a display name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
