//! Human-readable summary of a finished session

use crate::session::CrawlSession;
use std::fmt::Write;

/// Renders the final snapshot of a session as plain text
pub fn format_session_summary(session: &CrawlSession) -> String {
    let mut out = String::new();

    // writing to a String cannot fail
    let _ = writeln!(out, "=== Crawl Session {} ===\n", session.session_id);
    let _ = writeln!(out, "Status: {}", session.status);
    let _ = writeln!(
        out,
        "Pages: {}..={} ({} requested, stopped at page {})",
        session.requested_page_range.start_page,
        session.requested_page_range.end_page,
        session.total_pages,
        session.current_page
    );
    let _ = writeln!(
        out,
        "Items: {} processed, {} successful",
        session.total_items_processed, session.total_successful_items
    );

    if let Some(chapter) = &session.last_completed_chapter {
        let _ = writeln!(
            out,
            "Last chapter: {} #{} ({} images)",
            chapter.comic_name, chapter.chapter_number, chapter.image_count
        );
    }

    if !session.errors.is_empty() {
        let _ = writeln!(out, "\nErrors ({}):", session.errors.len());
        for error in &session.errors {
            let _ = writeln!(out, "  - {}: {}", error.item_key, error.message);
        }
    }

    out
}

/// Prints the session summary to stdout
pub fn print_session_summary(session: &CrawlSession) {
    print!("{}", format_session_summary(session));
}
