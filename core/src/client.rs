//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each remote action is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Any 2xx status counts as success; everything else is `ApiError::Http`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{NewTodo, TodoId, TodoItem};

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        self.bodyless(HttpMethod::Get, format!("{}/todos", self.base_url))
    }

    pub fn build_create_todo(&self, input: &NewTodo) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, format!("{}/todos", self.base_url), input)
    }

    pub fn build_update_todo(&self, id: TodoId, item: &TodoItem) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Put, format!("{}/todos/{id}", self.base_url), item)
    }

    pub fn build_delete_todo(&self, id: TodoId) -> HttpRequest {
        self.bodyless(HttpMethod::Delete, format!("{}/todos/{id}", self.base_url))
    }

    pub fn build_summarize(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/todos/summary", self.base_url),
            headers: json_headers(),
            body: Some("{}".to_string()),
        }
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<TodoItem>, ApiError> {
        check_status(&response)?;
        let todos: Vec<TodoItem> = decode(&response.body)?;
        if let Some(position) = todos.iter().position(|t| t.id.is_none()) {
            return Err(ApiError::MalformedResponse(format!("todo at index {position} has no id")));
        }
        Ok(todos)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<TodoItem, ApiError> {
        check_status(&response)?;
        require_id(decode(&response.body)?)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<TodoItem, ApiError> {
        check_status(&response)?;
        require_id(decode(&response.body)?)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    /// The summary is plain text, not JSON. Surrounding whitespace is dropped.
    pub fn parse_summarize(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response)?;
        let summary = response.body.trim();
        if summary.is_empty() {
            return Err(ApiError::MalformedResponse("empty summary".to_string()));
        }
        Ok(summary.to_string())
    }

    fn bodyless(&self, method: HttpMethod, path: String) -> HttpRequest {
        HttpRequest {
            method,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    fn with_json<T: Serialize>(&self, method: HttpMethod, path: String, payload: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path,
            headers: json_headers(),
            body: Some(body),
        })
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::MalformedResponse(e.to_string()))
}

fn require_id(item: TodoItem) -> Result<TodoItem, ApiError> {
    if item.id.is_none() {
        return Err(ApiError::MalformedResponse("todo has no id".to_string()));
    }
    Ok(item)
}
