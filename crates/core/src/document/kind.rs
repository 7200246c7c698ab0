use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The closed set of entity types that live in their own collection and can
/// be moved to the recycle bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemType {
    Article,
    Category,
    Author,
    StaticPage,
    BreakingNews,
    Tag,
}

impl ItemType {
    pub const ALL: [ItemType; 6] = [
        ItemType::Article,
        ItemType::Category,
        ItemType::Author,
        ItemType::StaticPage,
        ItemType::BreakingNews,
        ItemType::Tag,
    ];

    /// Canonical tag, as stored in `deleted_items.item_type` and `documents.kind`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Article => "article",
            ItemType::Category => "category",
            ItemType::Author => "author",
            ItemType::StaticPage => "staticPage",
            ItemType::BreakingNews => "breakingNews",
            ItemType::Tag => "tag",
        }
    }

    /// URL segment of the collection, e.g. `/v1/static-pages`.
    pub fn collection(&self) -> &'static str {
        match self {
            ItemType::Article => "articles",
            ItemType::Category => "categories",
            ItemType::Author => "authors",
            ItemType::StaticPage => "static-pages",
            ItemType::BreakingNews => "breaking-news",
            ItemType::Tag => "tags",
        }
    }

    pub fn from_collection(segment: &str) -> Option<Self> {
        ItemType::ALL.into_iter().find(|t| t.collection() == segment)
    }

    /// Field holding the human-readable label.
    pub fn label_field(&self) -> &'static str {
        match self {
            ItemType::Article | ItemType::StaticPage | ItemType::BreakingNews => "title",
            ItemType::Category | ItemType::Author | ItemType::Tag => "name",
        }
    }

    /// Boolean field that at most one document of this kind may hold `true`.
    pub fn exclusive_flag(&self) -> Option<&'static str> {
        match self {
            ItemType::BreakingNews => Some("isActive"),
            _ => None,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(ItemType::Article),
            "category" => Ok(ItemType::Category),
            "author" => Ok(ItemType::Author),
            // "page" and "breaking-news" are legacy spellings still sent by old clients.
            "staticPage" | "page" => Ok(ItemType::StaticPage),
            "breakingNews" | "breaking-news" => Ok(ItemType::BreakingNews),
            "tag" => Ok(ItemType::Tag),
            other => Err(CoreError::InvalidType(other.to_string())),
        }
    }
}
