use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub const NOTHING_PENDING: &str = "No pending to-dos to summarize.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "completed")]
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub created_on: DateTime<Utc>,
}

/// Create payload. Client-supplied `id`, `status` and `createdOn` are
/// accepted but ignored.
#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Full replacement of the mutable fields.
#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
}

#[derive(Default)]
pub struct Db {
    next_id: i64,
    todos: BTreeMap<i64, Todo>,
}

pub type SharedDb = Arc<RwLock<Db>>;

pub fn app() -> Router {
    let db: SharedDb = Arc::new(RwLock::new(Db::default()));
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/summary", post(summarize_todos))
        .route("/todos/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_todos(State(db): State<SharedDb>) -> Json<Vec<Todo>> {
    let db = db.read().await;
    Json(db.todos.values().cloned().collect())
}

async fn create_todo(
    State(db): State<SharedDb>,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), StatusCode> {
    if input.title.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let mut db = db.write().await;
    db.next_id += 1;
    let todo = Todo {
        id: db.next_id,
        title: input.title,
        description: input.description,
        status: Status::Pending,
        created_on: Utc::now(),
    };
    debug!(id = todo.id, "created todo");
    db.todos.insert(todo.id, todo.clone());
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(
    State(db): State<SharedDb>,
    Path(id): Path<i64>,
) -> Result<Json<Todo>, StatusCode> {
    let db = db.read().await;
    db.todos.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_todo(
    State(db): State<SharedDb>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<Todo>, StatusCode> {
    let mut db = db.write().await;
    let todo = db.todos.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    todo.title = input.title;
    todo.description = input.description;
    todo.status = input.status;
    debug!(id, status = ?todo.status, "updated todo");
    Ok(Json(todo.clone()))
}

async fn delete_todo(
    State(db): State<SharedDb>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let mut db = db.write().await;
    db.todos.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn summarize_todos(State(db): State<SharedDb>) -> String {
    let db = db.read().await;
    summarize(db.todos.values())
}

/// Deterministic stand-in for the language-model summary.
pub fn summarize<'a>(todos: impl IntoIterator<Item = &'a Todo>) -> String {
    let (pending, completed) = todos.into_iter().fold((0, 0), |(p, c), todo| match todo.status {
        Status::Pending => (p + 1, c),
        Status::Completed => (p, c + 1),
    });
    if pending == 0 {
        return NOTHING_PENDING.to_string();
    }
    format!("{pending} pending, {completed} completed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn todo(id: i64, status: Status) -> Todo {
        Todo {
            id,
            title: format!("Todo {id}"),
            description: None,
            status,
            created_on: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn todo_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(todo(1, Status::Pending)).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["createdOn"], "2025-01-01T00:00:00Z");
        assert!(json["description"].is_null());
    }

    #[test]
    fn create_todo_ignores_client_owned_fields() {
        let input: CreateTodo = serde_json::from_str(
            r#"{"id":99,"title":"Buy milk","description":"","status":"Completed","createdOn":"1999-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(input.title, "Buy milk");
        assert_eq!(input.description.as_deref(), Some(""));
    }

    #[test]
    fn create_todo_rejects_missing_title() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"description":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn update_todo_defaults_status_to_pending() {
        let input: UpdateTodo = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(input.status, Status::Pending);
        assert!(input.description.is_none());
    }

    #[test]
    fn update_todo_accepts_lowercase_status() {
        let input: UpdateTodo = serde_json::from_str(r#"{"title":"x","status":"completed"}"#).unwrap();
        assert_eq!(input.status, Status::Completed);
    }

    #[test]
    fn summary_counts_by_status() {
        let todos = [
            todo(1, Status::Pending),
            todo(2, Status::Completed),
            todo(3, Status::Pending),
        ];
        assert_eq!(summarize(&todos), "2 pending, 1 completed");
    }

    #[test]
    fn summary_with_nothing_pending() {
        assert_eq!(summarize(&[todo(1, Status::Completed)]), NOTHING_PENDING);
        assert_eq!(summarize(std::iter::empty()), NOTHING_PENDING);
    }
}
