/// Crawl session status definitions
///
/// A session moves `Started -> InProgress -> {Completed | Error | Stopped}`. A session may
/// also end straight from `Started` when it is stopped or fails before the first page.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the lifecycle state of a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    /// Session is registered and waiting for (or just handed to) a worker
    Started,

    /// Traversal is running
    InProgress,

    // ===== Terminal States =====
    /// Every requested page was traversed
    Completed,

    /// The run ended on a fatal error
    Error,

    /// The run ended early on an operator stop request
    Stopped,
}

impl CrawlStatus {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Stopped)
    }

    /// Returns true if the session may move from `self` to `next`
    pub fn can_transition_to(&self, next: CrawlStatus) -> bool {
        match self {
            Self::Started => matches!(next, Self::InProgress | Self::Error | Self::Stopped),
            Self::InProgress => matches!(next, Self::Completed | Self::Error | Self::Stopped),
            Self::Completed | Self::Error | Self::Stopped => false,
        }
    }

    /// Stable string form, matching the serialized representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [CrawlStatus; 5] = [
        CrawlStatus::Started,
        CrawlStatus::InProgress,
        CrawlStatus::Completed,
        CrawlStatus::Error,
        CrawlStatus::Stopped,
    ];

    #[test]
    fn test_is_terminal() {
        assert!(!CrawlStatus::Started.is_terminal());
        assert!(!CrawlStatus::InProgress.is_terminal());

        assert!(CrawlStatus::Completed.is_terminal());
        assert!(CrawlStatus::Error.is_terminal());
        assert!(CrawlStatus::Stopped.is_terminal());
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(CrawlStatus::Started.can_transition_to(CrawlStatus::InProgress));
        assert!(CrawlStatus::Started.can_transition_to(CrawlStatus::Stopped));
        assert!(CrawlStatus::Started.can_transition_to(CrawlStatus::Error));
        assert!(CrawlStatus::InProgress.can_transition_to(CrawlStatus::Completed));
        assert!(CrawlStatus::InProgress.can_transition_to(CrawlStatus::Stopped));
        assert!(CrawlStatus::InProgress.can_transition_to(CrawlStatus::Error));
    }

    #[test]
    fn test_rejected_transitions() {
        assert!(!CrawlStatus::Started.can_transition_to(CrawlStatus::Completed));
        assert!(!CrawlStatus::InProgress.can_transition_to(CrawlStatus::Started));

        for terminal in [
            CrawlStatus::Completed,
            CrawlStatus::Error,
            CrawlStatus::Stopped,
        ] {
            for next in ALL_STATES {
                assert!(
                    !terminal.can_transition_to(next),
                    "{:?} -> {:?} should be rejected",
                    terminal,
                    next
                );
            }
        }
    }

    #[test]
    fn test_serialized_form_matches_as_str() {
        for status in ALL_STATES {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CrawlStatus::InProgress), "in_progress");
        assert_eq!(format!("{}", CrawlStatus::Stopped), "stopped");
    }
}
