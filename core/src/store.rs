//! The local view of the remote todo collection.
//!
//! # Design
//! `TodoStore` is the single owner of the collection and the status slot.
//! Both live in a `tokio::sync::watch` channel: readers take immutable
//! `StoreSnapshot`s or subscribe to changes, and operations publish a new
//! snapshot when their response arrives.
//!
//! Operations take `&self` and never hold the state across an `.await`, so
//! several may be in flight at once on a single-threaded runtime. They are
//! not serialized against each other; whichever response resolves last
//! decides the final collection. A `load` that completes after a `create`
//! replaces the collection wholesale, including the appended item.
//!
//! Optimistic changes remember which `load` they were applied against. A
//! rollback is skipped once a newer `load` has replaced the collection, or
//! once the slot no longer holds the optimistic value.
//!
//! Remote failures are converted into `SyncStatus::Error` at the call site
//! and also returned as `StoreError::Remote`. Validation failures return an
//! error without touching state.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::client::TodoClient;
use crate::config::{StoreConfig, UpdatePolicy};
use crate::error::{Action, ApiError, StoreError};
use crate::status::SyncStatus;
use crate::transport::Transport;
use crate::types::{NewTodo, TodoDraft, TodoId, TodoItem};

/// Immutable view of the store at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub todos: Vec<TodoItem>,
    pub status: SyncStatus,
}

impl StoreSnapshot {
    pub fn get(&self, id: TodoId) -> Option<&TodoItem> {
        self.todos.iter().find(|t| t.id == Some(id))
    }
}

pub struct TodoStore<T> {
    client: TodoClient,
    transport: T,
    config: StoreConfig,
    state: watch::Sender<StoreSnapshot>,
    // bumped inside the publishing closure of every successful load
    loads: AtomicU64,
}

/// What an optimistic change displaced.
struct Displaced {
    generation: u64,
    index: usize,
    item: TodoItem,
}

impl<T: Transport> TodoStore<T> {
    /// An empty store. Nothing is fetched until `load` is called.
    pub fn new(client: TodoClient, transport: T, config: StoreConfig) -> Self {
        let (state, _) = watch::channel(StoreSnapshot::default());
        Self {
            client,
            transport,
            config,
            state,
            loads: AtomicU64::new(0),
        }
    }

    /// A store that has already attempted its initial `load`. A failed load
    /// leaves the collection empty with the error in the status slot.
    pub async fn open(client: TodoClient, transport: T, config: StoreConfig) -> Self {
        let store = Self::new(client, transport, config);
        // failure is already recorded in the status slot
        let _ = store.load().await;
        store
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.borrow().clone()
    }

    pub fn todos(&self) -> Vec<TodoItem> {
        self.state.borrow().todos.clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.state.borrow().status.clone()
    }

    /// A receiver that is notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    /// Replace the collection with the server's and clear the status.
    #[tracing::instrument(skip(self), fields(base_url = self.client.base_url()))]
    pub async fn load(&self) -> Result<(), StoreError> {
        match self.fetch_all().await {
            Ok(todos) => {
                debug!(count = todos.len(), "loaded todos");
                self.state.send_modify(|s| {
                    self.loads.fetch_add(1, Ordering::Relaxed);
                    s.todos = todos;
                    s.status = SyncStatus::Empty;
                });
                Ok(())
            }
            Err(err) => Err(self.fail(Action::Load, err)),
        }
    }

    /// Send a pending item built from `draft` and append the server's copy.
    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(&self, draft: TodoDraft) -> Result<TodoItem, StoreError> {
        if draft.title.trim().is_empty() {
            debug!("ignoring draft with empty title");
            return Err(StoreError::EmptyTitle);
        }

        let pending = NewTodo::pending(draft, Utc::now());
        match self.send_create(&pending).await {
            Ok(created) => {
                debug!(id = ?created.id, "created todo");
                let message = format!("Added \"{}\".", created.title);
                let item = created.clone();
                let id = item.id;
                self.state.send_modify(|s| {
                    // a concurrent load may already have delivered this id
                    match s.todos.iter_mut().find(|t| t.id == id) {
                        Some(existing) => *existing = item,
                        None => s.todos.push(item),
                    }
                    s.status = SyncStatus::Success(message);
                });
                Ok(created)
            }
            Err(err) => Err(self.fail(Action::Create, err)),
        }
    }

    /// Delete `id` remotely, then drop it locally.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: TodoId) -> Result<(), StoreError> {
        let detached = match self.config.policy {
            UpdatePolicy::Optimistic => self.detach(id),
            UpdatePolicy::Confirmed => None,
        };

        match self.send_delete(id).await {
            Ok(()) => {
                debug!("deleted todo");
                self.state.send_modify(|s| {
                    s.todos.retain(|t| t.id != Some(id));
                    s.status = SyncStatus::Success(format!("Deleted todo {id}."));
                });
                Ok(())
            }
            Err(err) => {
                if let Some(displaced) = detached {
                    self.reattach(displaced);
                }
                Err(self.fail(Action::Remove, err))
            }
        }
    }

    /// Flip the status of `item` remotely and adopt the server's copy.
    #[tracing::instrument(skip(self, item), fields(id = ?item.id))]
    pub async fn toggle_status(&self, item: &TodoItem) -> Result<TodoItem, StoreError> {
        let id = item.id.ok_or(StoreError::Unsaved)?;
        let toggled = item.toggled();

        let displaced = match self.config.policy {
            UpdatePolicy::Optimistic => self.replace(id, toggled.clone()),
            UpdatePolicy::Confirmed => None,
        };

        match self.send_update(id, &toggled).await {
            Ok(current) => {
                debug!(status = %current.status, "updated todo");
                let message = format!("Marked \"{}\" as {}.", current.title, current.status);
                let item = current.clone();
                self.state.send_modify(|s| {
                    if let Some(existing) = s.todos.iter_mut().find(|t| t.id == Some(id)) {
                        *existing = item;
                    }
                    s.status = SyncStatus::Success(message);
                });
                Ok(current)
            }
            Err(err) => {
                if let Some(displaced) = displaced {
                    self.restore(&toggled, displaced);
                }
                Err(self.fail(Action::Toggle, err))
            }
        }
    }

    /// Ask the server for a summary and put it in the status slot.
    #[tracing::instrument(skip(self))]
    pub async fn summarize(&self) -> Result<String, StoreError> {
        if !self.config.summarize {
            debug!("summaries disabled");
            return Err(StoreError::SummariesDisabled);
        }

        match self.send_summarize().await {
            Ok(summary) => {
                debug!("received summary");
                let status = SyncStatus::Success(summary.clone());
                self.state.send_modify(|s| s.status = status);
                Ok(summary)
            }
            Err(err) => Err(self.fail(Action::Summarize, err)),
        }
    }

    async fn fetch_all(&self) -> Result<Vec<TodoItem>, ApiError> {
        let response = self.transport.execute(self.client.build_list_todos()).await?;
        self.client.parse_list_todos(response)
    }

    async fn send_create(&self, input: &NewTodo) -> Result<TodoItem, ApiError> {
        let request = self.client.build_create_todo(input)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_create_todo(response)
    }

    async fn send_delete(&self, id: TodoId) -> Result<(), ApiError> {
        let response = self.transport.execute(self.client.build_delete_todo(id)).await?;
        self.client.parse_delete_todo(response)
    }

    async fn send_update(&self, id: TodoId, item: &TodoItem) -> Result<TodoItem, ApiError> {
        let request = self.client.build_update_todo(id, item)?;
        let response = self.transport.execute(request).await?;
        self.client.parse_update_todo(response)
    }

    async fn send_summarize(&self) -> Result<String, ApiError> {
        let response = self.transport.execute(self.client.build_summarize()).await?;
        self.client.parse_summarize(response)
    }

    /// Record a remote failure in the status slot and wrap it.
    fn fail(&self, action: Action, source: ApiError) -> StoreError {
        let err = StoreError::Remote { action, source };
        warn!(error = %err, "remote operation failed");
        let status = SyncStatus::Error(err.to_string());
        self.state.send_modify(|s| s.status = status);
        err
    }

    /// Remove `id` locally, returning where it was.
    fn detach(&self, id: TodoId) -> Option<Displaced> {
        let mut displaced = None;
        self.state.send_if_modified(|s| {
            let Some(index) = s.todos.iter().position(|t| t.id == Some(id)) else {
                return false;
            };
            displaced = Some(Displaced {
                generation: self.loads.load(Ordering::Relaxed),
                index,
                item: s.todos.remove(index),
            });
            true
        });
        displaced
    }

    /// Put a detached item back, unless a later load or another operation
    /// has settled the collection since.
    fn reattach(&self, displaced: Displaced) {
        self.state.send_if_modified(|s| {
            if self.loads.load(Ordering::Relaxed) != displaced.generation {
                debug!("collection reloaded, dropping rollback");
                return false;
            }
            if s.todos.iter().any(|t| t.id == displaced.item.id) {
                return false;
            }
            let index = displaced.index.min(s.todos.len());
            s.todos.insert(index, displaced.item);
            true
        });
    }

    /// Swap the item with `id` for `item`, returning the old one.
    fn replace(&self, id: TodoId, item: TodoItem) -> Option<Displaced> {
        let mut displaced = None;
        self.state.send_if_modified(|s| {
            let Some(index) = s.todos.iter().position(|t| t.id == Some(id)) else {
                return false;
            };
            displaced = Some(Displaced {
                generation: self.loads.load(Ordering::Relaxed),
                index,
                item: std::mem::replace(&mut s.todos[index], item),
            });
            true
        });
        displaced
    }

    /// Undo `replace`, but only while the slot still holds `applied` and no
    /// load has happened in between.
    fn restore(&self, applied: &TodoItem, displaced: Displaced) {
        self.state.send_if_modified(|s| {
            if self.loads.load(Ordering::Relaxed) != displaced.generation {
                debug!("collection reloaded, dropping rollback");
                return false;
            }
            match s.todos.iter_mut().find(|t| t.id == displaced.item.id) {
                Some(current) if *current == *applied => {
                    *current = displaced.item;
                    true
                }
                _ => false,
            }
        });
    }
}
