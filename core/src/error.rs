//! Error types for the todo client and store.
//!
//! # Design
//! `ApiError` covers everything that can go wrong on the far side of the
//! network boundary. The store does not distinguish between its variants: any
//! of them is a failed round-trip. `StoreError` adds the local validation
//! failures, which never reach the network, and wraps remote failures with
//! the action that produced them.

use std::fmt;

use thiserror::Error;

/// Errors produced while building requests, executing them, or parsing
/// responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connection refused, DNS,
    /// timeout in the underlying transport).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// The store operation a remote failure belongs to. Its display form is the
/// prefix of the status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Load,
    Create,
    Remove,
    Toggle,
    Summarize,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Action::Load => "load todos",
            Action::Create => "create todo",
            Action::Remove => "delete todo",
            Action::Toggle => "update todo",
            Action::Summarize => "summarize todos",
        };
        f.write_str(verb)
    }
}

/// Errors returned by `TodoStore` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The draft's title is empty after trimming.
    #[error("title must not be empty")]
    EmptyTitle,

    /// The item has no server-assigned id yet.
    #[error("todo has not been saved")]
    Unsaved,

    /// The store was configured without the summary action.
    #[error("summaries are disabled")]
    SummariesDisabled,

    /// The remote round-trip failed.
    #[error("Failed to {action}: {source}")]
    Remote {
        action: Action,
        #[source]
        source: ApiError,
    },
}

impl StoreError {
    /// True for failures that never left the process.
    pub fn is_validation(&self) -> bool {
        !matches!(self, StoreError::Remote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_message_is_prefixed_with_action() {
        let err = StoreError::Remote {
            action: Action::Remove,
            source: ApiError::Transport("connection refused".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to delete todo: transport error: connection refused"
        );
        assert!(!err.is_validation());
    }

    #[test]
    fn http_error_includes_status_and_body() {
        let err = ApiError::Http {
            status: 400,
            body: "Failed to Summarize".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 400: Failed to Summarize");
    }

    #[test]
    fn local_failures_are_validation_errors() {
        assert!(StoreError::EmptyTitle.is_validation());
        assert!(StoreError::Unsaved.is_validation());
        assert!(StoreError::SummariesDisabled.is_validation());
    }
}
