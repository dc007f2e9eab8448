//! Client-side synchronization core for a shared todo list.
//!
//! # Overview
//! `TodoStore` keeps a local view of a remote todo collection and mediates
//! every mutation through the remote service: load, create, remove, toggle
//! status, and summarize. The outcome of each operation lands in a single
//! `SyncStatus` slot; failures never corrupt the collection.
//!
//! # Design
//! - `TodoClient` is stateless and does no I/O: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`.
//! - `Transport` executes the round-trip in between. `ReqwestTransport` is
//!   the real one; tests plug in scripted transports.
//! - `TodoStore` publishes immutable `StoreSnapshot`s through a watch
//!   channel and applies results only when responses arrive.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod status;
pub mod store;
pub mod timestamp;
pub mod transport;
pub mod types;

pub use client::TodoClient;
pub use config::{ConfigError, Settings, StoreConfig, UpdatePolicy};
pub use error::{Action, ApiError, StoreError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use status::SyncStatus;
pub use store::{StoreSnapshot, TodoStore};
pub use transport::{ReqwestTransport, Transport};
pub use types::{NewTodo, TodoDraft, TodoId, TodoItem, TodoStatus};
