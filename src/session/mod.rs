//! Session module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlStatus`: lifecycle state of one crawl session
//! - `CrawlSession`: the full progress snapshot streamed to subscribers
//! - `CrawlRequest` / `PageRange`: what a caller asks to crawl

mod request;
mod snapshot;
mod status;

pub use request::{CrawlRequest, PageRange};
pub use snapshot::{ChapterSummary, CrawlSession, SessionError, TransitionError};
pub use status::CrawlStatus;
