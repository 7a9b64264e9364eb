//! Client-side state shared by Tether front ends

pub mod todos;

pub use todos::{Latency, TodoAction, TodoItem, TodoMutation, TodoState, TodoStore};
