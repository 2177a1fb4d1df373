//! Output module for crawl summaries and catalog statistics
//!
//! This module handles:
//! - Rendering the final snapshot of a session for the terminal
//! - Counting what the catalog holds

pub mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, CatalogStatistics};
pub use summary::{format_session_summary, print_session_summary};
