//! The crawl session snapshot
//!
//! A `CrawlSession` is owned by exactly one task for the duration of a run. Every progress
//! message carries a full clone of it, so consumers can replace their view wholesale.

use crate::session::{CrawlStatus, PageRange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected status change
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid state transition: {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: CrawlStatus,
    pub to: CrawlStatus,
}

/// The last chapter that was fully written to the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
    pub comic_name: String,
    pub comic_id: i64,
    pub chapter_number: f64,
    pub chapter_id: i64,
    pub image_count: usize,
}

/// An item-level failure recorded during the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionError {
    pub item_key: String,
    pub message: String,
}

/// Live state of one crawl run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSession {
    pub session_id: String,
    pub status: CrawlStatus,
    pub requested_page_range: PageRange,
    pub total_pages: u32,
    pub current_page: u32,
    pub current_item_slug: Option<String>,
    pub current_item_chapters_processed: u32,
    pub total_items_processed: u32,
    pub total_successful_items: u32,
    pub last_completed_chapter: Option<ChapterSummary>,
    pub errors: Vec<SessionError>,
    pub updated_at: DateTime<Utc>,
}

impl CrawlSession {
    pub fn new(session_id: impl Into<String>, range: PageRange) -> Self {
        Self {
            session_id: session_id.into(),
            status: CrawlStatus::Started,
            requested_page_range: range,
            total_pages: range.len(),
            current_page: 0,
            current_item_slug: None,
            current_item_chapters_processed: 0,
            total_items_processed: 0,
            total_successful_items: 0,
            last_completed_chapter: None,
            errors: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Moves the session to `next`, refusing edges the state machine does not allow
    pub fn transition(&mut self, next: CrawlStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    pub fn set_page(&mut self, page: u32) {
        self.current_page = page;
        self.touch();
    }

    /// Points the cursor at a new item and resets its chapter counter
    pub fn begin_item(&mut self, slug: &str) {
        self.current_item_slug = Some(slug.to_string());
        self.current_item_chapters_processed = 0;
        self.touch();
    }

    /// Counts a finished item; `successful` when it was created or gained chapters
    pub fn finish_item(&mut self, successful: bool) {
        self.total_items_processed += 1;
        if successful {
            self.total_successful_items += 1;
        }
        self.touch();
    }

    pub fn record_chapter(&mut self, summary: ChapterSummary) {
        self.last_completed_chapter = Some(summary);
        self.current_item_chapters_processed += 1;
        self.touch();
    }

    pub fn record_error(&mut self, item_key: impl Into<String>, message: impl Into<String>) {
        self.errors.push(SessionError {
            item_key: item_key.into(),
            message: message.into(),
        });
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> CrawlSession {
        CrawlSession::new(
            "abc",
            PageRange {
                start_page: 2,
                end_page: 4,
            },
        )
    }

    #[test]
    fn test_new_session() {
        let s = session();
        assert_eq!(s.status, CrawlStatus::Started);
        assert_eq!(s.total_pages, 3);
        assert!(s.errors.is_empty());
        assert!(s.last_completed_chapter.is_none());
    }

    #[test]
    fn test_transition_rules_enforced() {
        let mut s = session();
        assert!(s.transition(CrawlStatus::Completed).is_err());
        assert_eq!(s.status, CrawlStatus::Started);

        s.transition(CrawlStatus::InProgress).unwrap();
        s.transition(CrawlStatus::Completed).unwrap();

        let err = s.transition(CrawlStatus::Stopped).unwrap_err();
        assert_eq!(
            err,
            TransitionError {
                from: CrawlStatus::Completed,
                to: CrawlStatus::Stopped
            }
        );
    }

    #[test]
    fn test_item_cursor_resets_chapter_count() {
        let mut s = session();
        s.begin_item("one-piece");
        s.record_chapter(ChapterSummary {
            comic_name: "One Piece".to_string(),
            comic_id: 1,
            chapter_number: 1.0,
            chapter_id: 10,
            image_count: 3,
        });
        assert_eq!(s.current_item_chapters_processed, 1);

        s.begin_item("naruto");
        assert_eq!(s.current_item_slug.as_deref(), Some("naruto"));
        assert_eq!(s.current_item_chapters_processed, 0);
        // the last completed chapter survives the cursor move
        assert_eq!(s.last_completed_chapter.as_ref().unwrap().chapter_id, 10);
    }

    #[test]
    fn test_counters() {
        let mut s = session();
        s.finish_item(true);
        s.finish_item(false);
        assert_eq!(s.total_items_processed, 2);
        assert_eq!(s.total_successful_items, 1);
    }

    #[test]
    fn test_errors_append_in_order() {
        let mut s = session();
        s.record_error("a", "first");
        s.record_error("b", "second");
        let keys: Vec<_> = s.errors.iter().map(|e| e.item_key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(session()).unwrap();
        assert_eq!(json["sessionId"], "abc");
        assert_eq!(json["status"], "started");
        assert_eq!(json["requestedPageRange"]["startPage"], 2);
        assert_eq!(json["totalItemsProcessed"], 0);
    }
}
