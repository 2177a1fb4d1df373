//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the catalog database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Genre/category tags
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Comics, keyed by canonical slug
CREATE TABLE IF NOT EXISTS comics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    origin_name TEXT,
    thumb_url TEXT,
    status TEXT NOT NULL,
    description TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_comics_status ON comics(status);

CREATE TABLE IF NOT EXISTS comic_categories (
    comic_id INTEGER NOT NULL REFERENCES comics(id),
    category_id INTEGER NOT NULL REFERENCES categories(id),
    PRIMARY KEY (comic_id, category_id)
);

-- Chapters, one per (comic, chapter number)
CREATE TABLE IF NOT EXISTS chapters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    comic_id INTEGER NOT NULL REFERENCES comics(id),
    title TEXT NOT NULL,
    chapter_number REAL NOT NULL,
    status TEXT NOT NULL,
    domain_cdn TEXT,
    chapter_path TEXT,
    created_at TEXT NOT NULL,
    UNIQUE(comic_id, chapter_number)
);

CREATE INDEX IF NOT EXISTS idx_chapters_comic ON chapters(comic_id);

-- Chapter pages in reading order
CREATE TABLE IF NOT EXISTS chapter_images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chapter_id INTEGER NOT NULL REFERENCES chapters(id),
    ordinal INTEGER NOT NULL,
    image_file TEXT NOT NULL,
    UNIQUE(chapter_id, ordinal)
);

CREATE INDEX IF NOT EXISTS idx_chapter_images_chapter ON chapter_images(chapter_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
