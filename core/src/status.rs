//! The single-slot outcome message shown after each operation.

use std::fmt;

/// Outcome of the most recent store operation. Overwritten by every
/// operation that reaches the network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Empty,
    /// Success text, or the summary returned by `summarize`.
    Success(String),
    Error(String),
}

impl SyncStatus {
    /// The message text; empty for `Empty`.
    pub fn message(&self) -> &str {
        match self {
            SyncStatus::Empty => "",
            SyncStatus::Success(text) | SyncStatus::Error(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::Error(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SyncStatus::Empty)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_text() {
        assert_eq!(SyncStatus::Empty.message(), "");
        assert!(SyncStatus::default().is_empty());
    }

    #[test]
    fn error_is_flagged() {
        let status = SyncStatus::Error("Failed to load todos: HTTP 500: boom".to_string());
        assert!(status.is_error());
        assert_eq!(status.to_string(), "Failed to load todos: HTTP 500: boom");
        assert!(!SyncStatus::Success("ok".to_string()).is_error());
    }
}
