//! SQLite catalog implementation
//!
//! This module provides a SQLite-based implementation of the CatalogStore trait.

use crate::catalog::schema::initialize_schema;
use crate::catalog::traits::{CatalogStore, StorageError, StorageResult};
use crate::catalog::{
    CategoryRecord, ChapterImageRecord, ChapterRecord, ChapterStatus, ComicRecord, ComicStatus,
    NewChapter, NewChapterImage, NewComic, Upserted,
};
use crate::IngestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const COMIC_COLUMNS: &str =
    "id, name, slug, origin_name, thumb_url, status, description, created_at";

const CHAPTER_COLUMNS: &str =
    "id, comic_id, title, chapter_number, status, domain_cdn, chapter_path, created_at";

/// SQLite catalog backend
///
/// A single connection guarded by a mutex; every session shares one instance through an
/// `Arc<dyn CatalogStore>`.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Opens or creates a catalog database file
    pub fn new(path: &Path) -> Result<Self, IngestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory catalog
    pub fn new_in_memory() -> Result<Self, IngestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

fn comic_from_row(row: &Row<'_>) -> rusqlite::Result<ComicRecord> {
    Ok(ComicRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        origin_name: row.get(3)?,
        thumb_url: row.get(4)?,
        status: ComicStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(ComicStatus::ComingSoon),
        description: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn chapter_from_row(row: &Row<'_>) -> rusqlite::Result<ChapterRecord> {
    Ok(ChapterRecord {
        id: row.get(0)?,
        comic_id: row.get(1)?,
        title: row.get(2)?,
        chapter_number: row.get(3)?,
        status: ChapterStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(ChapterStatus::Free),
        domain_cdn: row.get(5)?,
        chapter_path: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn select_comic_by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Option<ComicRecord>> {
    conn.query_row(
        &format!("SELECT {} FROM comics WHERE slug = ?1", COMIC_COLUMNS),
        params![slug],
        comic_from_row,
    )
    .optional()
}

fn select_chapter(
    conn: &Connection,
    comic_id: i64,
    chapter_number: f64,
) -> rusqlite::Result<Option<ChapterRecord>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM chapters WHERE comic_id = ?1 AND chapter_number = ?2",
            CHAPTER_COLUMNS
        ),
        params![comic_id, chapter_number],
        chapter_from_row,
    )
    .optional()
}

fn count(conn: &Connection, sql: &str) -> StorageResult<u64> {
    let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count as u64)
}

impl CatalogStore for SqliteCatalog {
    // ===== Comics =====

    fn find_comic_by_slug(&self, slug: &str) -> StorageResult<Option<ComicRecord>> {
        let conn = self.lock()?;
        Ok(select_comic_by_slug(&conn, slug)?)
    }

    fn find_or_create_comic(&self, comic: &NewComic) -> StorageResult<Upserted<ComicRecord>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let now = Utc::now().to_rfc3339();
        let inserted = tx.execute(
            "INSERT INTO comics (name, slug, origin_name, thumb_url, status, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(slug) DO NOTHING",
            params![
                comic.name,
                comic.slug,
                comic.origin_name,
                comic.thumb_url,
                comic.status.to_db_string(),
                comic.description,
                now
            ],
        )?;

        if inserted == 1 {
            let comic_id = tx.last_insert_rowid();
            for category_id in &comic.category_ids {
                tx.execute(
                    "INSERT OR IGNORE INTO comic_categories (comic_id, category_id) VALUES (?1, ?2)",
                    params![comic_id, category_id],
                )?;
            }
        }

        let record = select_comic_by_slug(&tx, &comic.slug)?.ok_or_else(|| {
            StorageError::Database(format!("comic '{}' missing after insert", comic.slug))
        })?;
        tx.commit()?;

        Ok(Upserted {
            record,
            created: inserted == 1,
        })
    }

    fn categories_for_comic(&self, comic_id: i64) -> StorageResult<Vec<CategoryRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, c.slug FROM categories c
             JOIN comic_categories cc ON cc.category_id = c.id
             WHERE cc.comic_id = ?1
             ORDER BY c.slug",
        )?;

        let categories = stmt
            .query_map(params![comic_id], |row| {
                Ok(CategoryRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    slug: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    // ===== Categories =====

    fn find_or_create_category(&self, name: &str, slug: &str) -> StorageResult<CategoryRecord> {
        if slug.is_empty() {
            return Err(StorageError::ConstraintViolation(format!(
                "category '{}' has an empty slug",
                name
            )));
        }

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO categories (name, slug, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(slug) DO NOTHING",
            params![name, slug, Utc::now().to_rfc3339()],
        )?;

        let category = conn.query_row(
            "SELECT id, name, slug FROM categories WHERE slug = ?1",
            params![slug],
            |row| {
                Ok(CategoryRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    slug: row.get(2)?,
                })
            },
        )?;

        Ok(category)
    }

    // ===== Chapters =====

    fn max_chapter_number(&self, comic_id: i64) -> StorageResult<Option<f64>> {
        let conn = self.lock()?;
        let max: Option<f64> = conn.query_row(
            "SELECT MAX(chapter_number) FROM chapters WHERE comic_id = ?1",
            params![comic_id],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    fn chapter_exists(&self, comic_id: i64, chapter_number: f64) -> StorageResult<bool> {
        let conn = self.lock()?;
        Ok(select_chapter(&conn, comic_id, chapter_number)?.is_some())
    }

    fn insert_chapter_with_images(
        &self,
        chapter: &NewChapter,
        images: &[NewChapterImage],
    ) -> StorageResult<Upserted<ChapterRecord>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let comic_exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM comics WHERE id = ?1",
                params![chapter.comic_id],
                |row| row.get(0),
            )
            .optional()?;
        if comic_exists.is_none() {
            return Err(StorageError::ComicNotFound(chapter.comic_id));
        }

        let inserted = tx.execute(
            "INSERT INTO chapters (comic_id, title, chapter_number, status, domain_cdn, chapter_path, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(comic_id, chapter_number) DO NOTHING",
            params![
                chapter.comic_id,
                chapter.title,
                chapter.chapter_number,
                chapter.status.to_db_string(),
                chapter.domain_cdn,
                chapter.chapter_path,
                Utc::now().to_rfc3339()
            ],
        )?;

        if inserted == 1 {
            let chapter_id = tx.last_insert_rowid();
            let mut stmt = tx.prepare(
                "INSERT INTO chapter_images (chapter_id, ordinal, image_file) VALUES (?1, ?2, ?3)",
            )?;
            for image in images {
                stmt.execute(params![chapter_id, image.ordinal, image.image_file])?;
            }
            drop(stmt);

            tx.execute(
                "UPDATE comics SET updated_at = ?1 WHERE id = ?2",
                params![Utc::now().to_rfc3339(), chapter.comic_id],
            )?;
        }

        let record = select_chapter(&tx, chapter.comic_id, chapter.chapter_number)?.ok_or_else(
            || {
                StorageError::Database(format!(
                    "chapter {} of comic {} missing after insert",
                    chapter.chapter_number, chapter.comic_id
                ))
            },
        )?;
        tx.commit()?;

        Ok(Upserted {
            record,
            created: inserted == 1,
        })
    }

    fn list_chapters(&self, comic_id: i64) -> StorageResult<Vec<ChapterRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM chapters WHERE comic_id = ?1 ORDER BY id",
            CHAPTER_COLUMNS
        ))?;

        let chapters = stmt
            .query_map(params![comic_id], chapter_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(chapters)
    }

    fn chapter_images(&self, chapter_id: i64) -> StorageResult<Vec<ChapterImageRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, chapter_id, ordinal, image_file FROM chapter_images
             WHERE chapter_id = ?1 ORDER BY ordinal",
        )?;

        let images = stmt
            .query_map(params![chapter_id], |row| {
                Ok(ChapterImageRecord {
                    id: row.get(0)?,
                    chapter_id: row.get(1)?,
                    ordinal: row.get(2)?,
                    image_file: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(images)
    }

    // ===== Statistics =====

    fn count_comics(&self) -> StorageResult<u64> {
        count(&*self.lock()?, "SELECT COUNT(*) FROM comics")
    }

    fn count_categories(&self) -> StorageResult<u64> {
        count(&*self.lock()?, "SELECT COUNT(*) FROM categories")
    }

    fn count_chapters(&self) -> StorageResult<u64> {
        count(&*self.lock()?, "SELECT COUNT(*) FROM chapters")
    }

    fn count_images(&self) -> StorageResult<u64> {
        count(&*self.lock()?, "SELECT COUNT(*) FROM chapter_images")
    }
}
