//! Catalog module for persisting ingested comics
//!
//! This module handles all catalog writes made by the crawler, including:
//! - Find-or-create of comics and categories by slug
//! - Chapter high-water-mark and existence lookups
//! - Atomic chapter + image list inserts
//! - Counts for the statistics output

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCatalog;
pub use traits::{CatalogStore, StorageError, StorageResult};

use crate::IngestError;
use std::path::Path;

/// Opens (creating if needed) an on-disk catalog
pub fn open_catalog(path: &Path) -> Result<SqliteCatalog, IngestError> {
    SqliteCatalog::new(path)
}

/// Publication status of a comic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComicStatus {
    Ongoing,
    Completed,
    ComingSoon,
}

impl ComicStatus {
    /// Maps the status string used by the source; anything unknown is `ComingSoon`
    pub fn from_source(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "ongoing" => Self::Ongoing,
            "completed" => Self::Completed,
            _ => Self::ComingSoon,
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::ComingSoon => "coming_soon",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "ongoing" => Some(Self::Ongoing),
            "completed" => Some(Self::Completed),
            "coming_soon" => Some(Self::ComingSoon),
            _ => None,
        }
    }
}

/// Access tier of a chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChapterStatus {
    Free,
    Vip,
}

impl ChapterStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Vip => "vip",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "vip" => Some(Self::Vip),
            _ => None,
        }
    }
}

/// A comic row
#[derive(Debug, Clone, PartialEq)]
pub struct ComicRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub origin_name: Option<String>,
    pub thumb_url: Option<String>,
    pub status: ComicStatus,
    pub description: Option<String>,
    pub created_at: String,
}

/// A comic to be created
#[derive(Debug, Clone)]
pub struct NewComic {
    pub name: String,
    pub slug: String,
    pub origin_name: Option<String>,
    pub thumb_url: Option<String>,
    pub status: ComicStatus,
    pub description: Option<String>,
    pub category_ids: Vec<i64>,
}

/// A category row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// A chapter row
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterRecord {
    pub id: i64,
    pub comic_id: i64,
    pub title: String,
    pub chapter_number: f64,
    pub status: ChapterStatus,
    pub domain_cdn: Option<String>,
    pub chapter_path: Option<String>,
    pub created_at: String,
}

/// A chapter header to be created
#[derive(Debug, Clone)]
pub struct NewChapter {
    pub comic_id: i64,
    pub title: String,
    pub chapter_number: f64,
    pub status: ChapterStatus,
    pub domain_cdn: Option<String>,
    pub chapter_path: Option<String>,
}

/// One image of a chapter to be created; `ordinal` is 1-based source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChapterImage {
    pub ordinal: u32,
    pub image_file: String,
}

/// A chapter image row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterImageRecord {
    pub id: i64,
    pub chapter_id: i64,
    pub ordinal: u32,
    pub image_file: String,
}

/// Row returned by a find-or-create write
///
/// `created` is false when the natural key already existed and nothing was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<T> {
    pub record: T,
    pub created: bool,
}
