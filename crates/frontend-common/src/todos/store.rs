//! Async todo store with per-operation loading flags

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use super::mock::mock_todos;
use super::state::{TodoAction, TodoItem, TodoMutation, TodoState};

/// Simulated round-trip time of each operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Latency {
    pub fetch: Duration,
    pub add: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            fetch: Duration::from_millis(1000),
            add: Duration::from_millis(800),
            update: Duration::from_millis(700),
            delete: Duration::from_millis(500),
        }
    }
}

impl Latency {
    /// No waiting at all
    pub fn none() -> Self {
        Self {
            fetch: Duration::ZERO,
            add: Duration::ZERO,
            update: Duration::ZERO,
            delete: Duration::ZERO,
        }
    }
}

/// Shared handle to the todo list
///
/// Operations don't coordinate with each other; the last mutation applied
/// wins.
#[derive(Clone, Debug, Default)]
pub struct TodoStore {
    state: Arc<Mutex<TodoState>>,
    latency: Latency,
    last_id: Arc<AtomicI64>,
}

/// Holds an action's loading flag up until drop
struct LoadingGuard {
    state: Arc<Mutex<TodoState>>,
    action: TodoAction,
}

impl LoadingGuard {
    fn acquire(state: Arc<Mutex<TodoState>>, action: TodoAction) -> Self {
        set_loading(&state, action, true);
        Self { state, action }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        set_loading(&self.state, self.action, false);
    }
}

fn lock(state: &Mutex<TodoState>) -> MutexGuard<'_, TodoState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn set_loading(state: &Mutex<TodoState>, action: TodoAction, value: bool) {
    lock(state).apply(TodoMutation::SetLoading {
        key: action.key().to_string(),
        value,
    });
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Latency) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    /// Snapshot of the list, newest first
    pub fn todos(&self) -> Vec<TodoItem> {
        lock(&self.state).todos.clone()
    }

    pub fn is_loading(&self, key: &str) -> bool {
        lock(&self.state).is_loading(key)
    }

    /// Replace the list with the mock dataset
    pub async fn fetch_todos(&self) {
        let _loading = self.begin(TodoAction::FetchTodos);
        tokio::time::sleep(self.latency.fetch).await;

        let todos = mock_todos();
        debug!(count = todos.len(), "Fetched todos");
        self.commit(TodoMutation::SetTodos(todos));
    }

    /// Prepend a new, open item and return it
    pub async fn add_todo(&self, title: impl Into<String>) -> TodoItem {
        let _loading = self.begin(TodoAction::AddTodo);
        tokio::time::sleep(self.latency.add).await;

        let todo = TodoItem {
            id: self.next_id(),
            title: title.into(),
            completed: false,
        };
        debug!(id = todo.id, "Added todo");
        self.commit(TodoMutation::AddTodo(todo.clone()));
        todo
    }

    /// Replace the item with the same id, if there is one
    pub async fn update_todo(&self, todo: TodoItem) {
        let _loading = self.begin(TodoAction::UpdateTodo);
        tokio::time::sleep(self.latency.update).await;

        debug!(id = todo.id, "Updated todo");
        self.commit(TodoMutation::UpdateTodo(todo));
    }

    pub async fn delete_todo(&self, id: i64) {
        let _loading = self.begin(TodoAction::DeleteTodo);
        tokio::time::sleep(self.latency.delete).await;

        debug!(id, "Deleted todo");
        self.commit(TodoMutation::DeleteTodo(id));
    }

    fn begin(&self, action: TodoAction) -> LoadingGuard {
        LoadingGuard::acquire(self.state.clone(), action)
    }

    fn commit(&self, mutation: TodoMutation) {
        lock(&self.state).apply(mutation);
    }

    /// Wall-clock millis, bumped past the previous id when two adds share a millisecond
    fn next_id(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let previous = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fetch_sets_and_clears_loading() {
        let store = TodoStore::new();

        let task = tokio::spawn({
            let store = store.clone();
            async move { store.fetch_todos().await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(store.is_loading("fetchTodos"));
        assert!(store.todos().is_empty());

        task.await.unwrap();
        assert!(!store.is_loading("fetchTodos"));
        assert_eq!(store.todos(), mock_todos());
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_takes_the_configured_latency() {
        let store = TodoStore::new();
        let started = tokio::time::Instant::now();
        store.fetch_todos().await;
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn add_prepends_open_item_with_fresh_id() {
        let store = TodoStore::new();
        store.fetch_todos().await;

        let first = store.add_todo("x").await;
        let second = store.add_todo("y").await;

        assert!(!first.completed);
        assert_eq!(first.title, "x");
        assert!(second.id > first.id);

        let todos = store.todos();
        assert_eq!(todos[0], second);
        assert_eq!(todos[1], first);
        assert_eq!(todos.len(), mock_todos().len() + 2);
        assert!(!store.is_loading("addTodo"));
    }

    #[tokio::test(start_paused = true)]
    async fn update_and_delete() {
        let store = TodoStore::new();
        store.fetch_todos().await;

        let mut third = store.todos()[2].clone();
        third.completed = true;
        store.update_todo(third.clone()).await;
        assert_eq!(store.todos()[2], third);

        store.delete_todo(third.id).await;
        assert!(store.todos().iter().all(|t| t.id != third.id));
        assert!(!store.is_loading("updateTodo"));
        assert!(!store.is_loading("deleteTodo"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_operation_releases_loading() {
        let store = TodoStore::new();

        let result =
            tokio::time::timeout(Duration::from_millis(100), store.fetch_todos()).await;
        assert!(result.is_err());

        assert!(!store.is_loading("fetchTodos"));
        assert!(store.todos().is_empty());
    }

    #[tokio::test]
    async fn zero_latency_store() {
        let store = TodoStore::with_latency(Latency::none());
        store.fetch_todos().await;
        assert_eq!(store.todos().len(), 9);
        assert!(!store.is_loading("fetchTodos"));
    }
}
