//! Domain DTOs for the todo API.
//!
//! # Design
//! These types mirror the remote service's JSON schema but are defined
//! independently of the mock-server crate. Integration tests catch any schema
//! drift between the two.
//!
//! `TodoItem::id` is optional because a draft has no identity until the
//! create round-trip completes. Every item the store holds carries one; the
//! client rejects server responses that omit it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

/// Server-assigned identifier of a todo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub i64);

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Completion state of a todo item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TodoStatus {
    #[default]
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "completed")]
    Completed,
}

impl TodoStatus {
    /// The opposite state.
    pub fn toggled(self) -> Self {
        match self {
            TodoStatus::Pending => TodoStatus::Completed,
            TodoStatus::Completed => TodoStatus::Pending,
        }
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodoStatus::Pending => f.write_str("Pending"),
            TodoStatus::Completed => f.write_str("Completed"),
        }
    }
}

/// A single todo item as exchanged with the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TodoId>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp")]
    pub created_on: Option<DateTime<Utc>>,
}

impl TodoItem {
    /// Copy of this item with its status flipped.
    pub fn toggled(&self) -> Self {
        Self {
            status: self.status.toggled(),
            ..self.clone()
        }
    }
}

/// User input for a new todo, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub description: Option<String>,
}

impl TodoDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Request payload for creating a todo. Carries no `id`; the server assigns
/// one and may override `status` and `created_on`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp")]
    pub created_on: Option<DateTime<Utc>>,
}

impl NewTodo {
    /// A pending item built from `draft`, stamped with `now`.
    pub fn pending(draft: TodoDraft, now: DateTime<Utc>) -> Self {
        Self {
            title: draft.title,
            description: draft.description,
            status: TodoStatus::Pending,
            created_on: Some(now),
        }
    }
}
