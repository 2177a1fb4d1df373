use serde::{Deserialize, Serialize};

/// A request to crawl a range of source listing pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    pub start_page: u32,
    pub end_page: u32,
    /// Accepted and carried through the run; no secondary storage is wired yet
    #[serde(default)]
    pub save_to_secondary_storage: bool,
}

impl CrawlRequest {
    pub fn new(start_page: u32, end_page: u32) -> Self {
        Self {
            start_page,
            end_page,
            save_to_secondary_storage: false,
        }
    }

    /// Checks `start_page >= 1` and `end_page >= start_page`
    pub fn validate(&self) -> Result<(), String> {
        if self.start_page < 1 {
            return Err(format!("start_page must be >= 1, got {}", self.start_page));
        }
        if self.end_page < self.start_page {
            return Err(format!(
                "end_page ({}) must be >= start_page ({})",
                self.end_page, self.start_page
            ));
        }
        Ok(())
    }

    pub fn page_range(&self) -> PageRange {
        PageRange {
            start_page: self.start_page,
            end_page: self.end_page,
        }
    }
}

/// Inclusive range of listing pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRange {
    pub start_page: u32,
    pub end_page: u32,
}

impl PageRange {
    /// Number of pages in the range, zero when inverted
    pub fn len(&self) -> u32 {
        if self.end_page < self.start_page {
            0
        } else {
            self.end_page - self.start_page + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.start_page..=self.end_page
    }
}
