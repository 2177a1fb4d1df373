//! Statistics generation from the catalog
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics from the storage layer.

use crate::catalog::{CatalogStore, StorageResult};

/// Catalog statistics summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogStatistics {
    /// Total number of comics
    pub comics: u64,

    /// Total number of categories
    pub categories: u64,

    /// Total number of chapters across all comics
    pub chapters: u64,

    /// Total number of chapter images
    pub images: u64,
}

impl CatalogStatistics {
    /// Average chapters per comic, zero for an empty catalog
    pub fn chapters_per_comic(&self) -> f64 {
        if self.comics == 0 {
            0.0
        } else {
            self.chapters as f64 / self.comics as f64
        }
    }

    /// Average images per chapter, zero when there are no chapters
    pub fn images_per_chapter(&self) -> f64 {
        if self.chapters == 0 {
            0.0
        } else {
            self.images as f64 / self.chapters as f64
        }
    }
}

/// Loads statistics from the catalog
///
/// # Arguments
///
/// * `catalog` - The catalog backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(catalog: &dyn CatalogStore) -> StorageResult<CatalogStatistics> {
    Ok(CatalogStatistics {
        comics: catalog.count_comics()?,
        categories: catalog.count_categories()?,
        chapters: catalog.count_chapters()?,
        images: catalog.count_images()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Comics: {}", stats.comics);
    println!("  Categories: {}", stats.categories);
    println!("  Chapters: {}", stats.chapters);
    println!("  Images: {}", stats.images);
    println!();

    println!("Averages:");
    println!("  Chapters per comic: {:.1}", stats.chapters_per_comic());
    println!("  Images per chapter: {:.1}", stats.images_per_chapter());
}
