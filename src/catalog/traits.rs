//! Catalog store trait and error types

use crate::catalog::{
    CategoryRecord, ChapterImageRecord, ChapterRecord, ComicRecord, NewChapter, NewChapterImage,
    NewComic, Upserted,
};
use thiserror::Error;

/// Errors that can occur during catalog operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Comic not found: {0}")]
    ComicNotFound(i64),

    #[error("Catalog connection lock poisoned")]
    LockPoisoned,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Result type for catalog operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for catalog backend implementations
///
/// Implementations are shared by every running session and must be safe to call from
/// several threads at once. All create operations are find-or-create on the natural key,
/// so two sessions racing on the same slug end up with one row.
pub trait CatalogStore: Send + Sync {
    // ===== Comics =====

    /// Looks up a comic by its canonical slug
    fn find_comic_by_slug(&self, slug: &str) -> StorageResult<Option<ComicRecord>>;

    /// Creates the comic and links its categories, or returns the existing row for the slug
    fn find_or_create_comic(&self, comic: &NewComic) -> StorageResult<Upserted<ComicRecord>>;

    /// Categories linked to a comic, ordered by slug
    fn categories_for_comic(&self, comic_id: i64) -> StorageResult<Vec<CategoryRecord>>;

    // ===== Categories =====

    /// Returns the category with this slug, creating it with `name` if absent
    fn find_or_create_category(&self, name: &str, slug: &str) -> StorageResult<CategoryRecord>;

    // ===== Chapters =====

    /// Highest persisted chapter number for a comic, `None` when it has no chapters
    fn max_chapter_number(&self, comic_id: i64) -> StorageResult<Option<f64>>;

    /// Whether the comic already has a chapter with exactly this number
    fn chapter_exists(&self, comic_id: i64, chapter_number: f64) -> StorageResult<bool>;

    /// Writes a chapter header and its ordered images as one unit
    ///
    /// If the comic already has a chapter with this number the existing row is returned
    /// with `created == false` and no images are written.
    fn insert_chapter_with_images(
        &self,
        chapter: &NewChapter,
        images: &[NewChapterImage],
    ) -> StorageResult<Upserted<ChapterRecord>>;

    /// Chapters of a comic in insertion order
    fn list_chapters(&self, comic_id: i64) -> StorageResult<Vec<ChapterRecord>>;

    /// Images of a chapter ordered by ordinal
    fn chapter_images(&self, chapter_id: i64) -> StorageResult<Vec<ChapterImageRecord>>;

    // ===== Statistics =====

    fn count_comics(&self) -> StorageResult<u64>;

    fn count_categories(&self) -> StorageResult<u64>;

    fn count_chapters(&self) -> StorageResult<u64>;

    fn count_images(&self) -> StorageResult<u64>;
}
