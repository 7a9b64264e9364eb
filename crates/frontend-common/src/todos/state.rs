//! Todo state and the mutations applied to it

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

/// Store operations, each with its own loading flag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TodoAction {
    FetchTodos,
    AddTodo,
    UpdateTodo,
    DeleteTodo,
}

impl TodoAction {
    /// Key of the action's loading flag
    pub fn key(self) -> &'static str {
        match self {
            Self::FetchTodos => "fetchTodos",
            Self::AddTodo => "addTodo",
            Self::UpdateTodo => "updateTodo",
            Self::DeleteTodo => "deleteTodo",
        }
    }
}

impl fmt::Display for TodoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Every change to [`TodoState`] goes through one of these
#[derive(Clone, Debug, PartialEq)]
pub enum TodoMutation {
    SetTodos(Vec<TodoItem>),
    AddTodo(TodoItem),
    UpdateTodo(TodoItem),
    DeleteTodo(i64),
    SetLoading { key: String, value: bool },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TodoState {
    pub todos: Vec<TodoItem>,
    pub loading: HashMap<String, bool>,
}

impl TodoState {
    pub fn apply(&mut self, mutation: TodoMutation) {
        match mutation {
            TodoMutation::SetTodos(todos) => self.todos = todos,
            TodoMutation::AddTodo(todo) => self.todos.insert(0, todo),
            TodoMutation::UpdateTodo(updated) => {
                if let Some(slot) = self.todos.iter_mut().find(|t| t.id == updated.id) {
                    *slot = updated;
                }
            }
            TodoMutation::DeleteTodo(id) => self.todos.retain(|t| t.id != id),
            TodoMutation::SetLoading { key, value } => {
                self.loading.insert(key, value);
            }
        }
    }

    /// Unknown keys read as not loading
    pub fn is_loading(&self, key: &str) -> bool {
        self.loading.get(key).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, title: &str) -> TodoItem {
        TodoItem {
            id,
            title: title.to_string(),
            completed: false,
        }
    }

    #[test]
    fn add_prepends() {
        let mut state = TodoState::default();
        state.apply(TodoMutation::SetTodos(vec![item(1, "a")]));
        state.apply(TodoMutation::AddTodo(item(2, "b")));
        assert_eq!(state.todos, vec![item(2, "b"), item(1, "a")]);
    }

    #[test]
    fn update_replaces_in_place() {
        let mut state = TodoState::default();
        state.apply(TodoMutation::SetTodos(vec![item(1, "a"), item(2, "b"), item(3, "c")]));

        let done = TodoItem {
            completed: true,
            ..item(2, "b!")
        };
        state.apply(TodoMutation::UpdateTodo(done.clone()));
        assert_eq!(state.todos, vec![item(1, "a"), done, item(3, "c")]);
    }

    #[test]
    fn update_of_unknown_id_is_ignored() {
        let mut state = TodoState::default();
        state.apply(TodoMutation::SetTodos(vec![item(1, "a")]));
        state.apply(TodoMutation::UpdateTodo(item(9, "ghost")));
        assert_eq!(state.todos, vec![item(1, "a")]);
    }

    #[test]
    fn delete_removes_by_id() {
        let mut state = TodoState::default();
        state.apply(TodoMutation::SetTodos(vec![item(1, "a"), item(2, "b")]));
        state.apply(TodoMutation::DeleteTodo(1));
        assert_eq!(state.todos, vec![item(2, "b")]);
    }

    #[test]
    fn loading_flags_default_to_false() {
        let mut state = TodoState::default();
        assert!(!state.is_loading("fetchTodos"));

        state.apply(TodoMutation::SetLoading {
            key: TodoAction::FetchTodos.key().to_string(),
            value: true,
        });
        assert!(state.is_loading("fetchTodos"));
        assert!(!state.is_loading("addTodo"));
    }

    #[test]
    fn action_keys() {
        assert_eq!(TodoAction::FetchTodos.to_string(), "fetchTodos");
        assert_eq!(TodoAction::DeleteTodo.key(), "deleteTodo");
    }
}
