//! End-to-end store tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port inside the test's own
//! runtime, then drives a `TodoStore` over real HTTP with `ReqwestTransport`.
//! This validates request building, response parsing, and the store's
//! reconciliation rules against an actual server.

use todo_sync::{
    Action, ReqwestTransport, StoreConfig, StoreError, TodoClient, TodoDraft, TodoId, TodoStatus,
    TodoStore, UpdatePolicy,
};

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

/// An address nothing is listening on.
fn dead_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn open(base_url: &str, config: StoreConfig) -> TodoStore<ReqwestTransport> {
    TodoStore::open(TodoClient::new(base_url), ReqwestTransport::new(), config).await
}

#[tokio::test]
async fn full_session() {
    let base_url = start_server().await;
    let store = open(&base_url, StoreConfig::default()).await;

    // initial load: empty, no message
    assert!(store.todos().is_empty());
    assert!(store.status().is_empty());

    // create two
    let milk = store
        .create(TodoDraft::new("Buy milk").with_description(""))
        .await
        .unwrap();
    let dog = store.create(TodoDraft::new("Walk dog")).await.unwrap();
    assert_eq!(milk.id, Some(TodoId(1)));
    assert_eq!(dog.id, Some(TodoId(2)));
    assert_eq!(milk.status, TodoStatus::Pending);
    assert!(milk.created_on.is_some());
    assert_eq!(store.todos(), vec![milk.clone(), dog.clone()]);

    // blank title: nothing sent
    assert_eq!(
        store.create(TodoDraft::new("  ")).await.unwrap_err(),
        StoreError::EmptyTitle
    );

    // toggle
    let toggled = store.toggle_status(&milk).await.unwrap();
    assert_eq!(toggled.status, TodoStatus::Completed);
    assert_eq!(toggled.created_on, milk.created_on);
    assert_eq!(store.todos()[0].status, TodoStatus::Completed);
    assert_eq!(store.todos()[1], dog);

    // summary
    let summary = store.summarize().await.unwrap();
    assert_eq!(summary, "1 pending, 1 completed");
    assert_eq!(store.status().message(), "1 pending, 1 completed");

    // reload matches local view
    let before_reload = store.todos();
    store.load().await.unwrap();
    assert_eq!(store.todos(), before_reload);
    assert!(store.status().is_empty());

    // remove
    store.remove(TodoId(2)).await.unwrap();
    assert_eq!(store.todos().len(), 1);
    assert!(store.snapshot().get(TodoId(2)).is_none());

    // remove again: server says 404, nothing changes locally
    let before = store.todos();
    let err = store.remove(TodoId(2)).await.unwrap_err();
    assert!(matches!(err, StoreError::Remote { action: Action::Remove, .. }));
    assert_eq!(store.todos(), before);
    assert!(store.status().message().starts_with("Failed to delete todo: HTTP 404"));
}

#[tokio::test]
async fn toggle_of_item_deleted_elsewhere_fails_cleanly() {
    let base_url = start_server().await;
    let first = open(&base_url, StoreConfig::default()).await;
    let second = open(&base_url, StoreConfig::default()).await;

    let item = first.create(TodoDraft::new("Shared")).await.unwrap();
    second.load().await.unwrap();
    second.remove(item.id.unwrap()).await.unwrap();

    let before = first.todos();
    let err = first.toggle_status(&item).await.unwrap_err();
    assert!(matches!(err, StoreError::Remote { action: Action::Toggle, .. }));
    assert_eq!(first.todos(), before);
}

#[tokio::test]
async fn optimistic_store_rolls_back_rejected_delete() {
    let base_url = start_server().await;
    let config = StoreConfig {
        policy: UpdatePolicy::Optimistic,
        ..StoreConfig::default()
    };
    let first = open(&base_url, config).await;
    let second = open(&base_url, config).await;

    let item = first.create(TodoDraft::new("Contested")).await.unwrap();
    second.load().await.unwrap();
    second.remove(item.id.unwrap()).await.unwrap();

    assert!(first.remove(item.id.unwrap()).await.is_err());
    assert_eq!(first.todos(), vec![item]);
}

#[tokio::test]
async fn unreachable_server_surfaces_transport_errors() {
    let store = open(&dead_address(), StoreConfig::default()).await;

    assert!(store.todos().is_empty());
    assert!(store.status().is_error());
    assert!(store.status().message().starts_with("Failed to load todos: transport error"));

    let err = store.remove(TodoId(1)).await.unwrap_err();
    assert!(matches!(err, StoreError::Remote { action: Action::Remove, .. }));
    assert!(store.status().message().starts_with("Failed to delete todo"));

    assert!(store.create(TodoDraft::new("Offline")).await.is_err());
    assert!(store.summarize().await.is_err());
    assert!(store.todos().is_empty());
}
