//! Todo list state
//!
//! The store simulates a backend: every operation waits for a fixed latency
//! before applying its mutation to the in-memory list.

pub mod mock;
pub mod state;
pub mod store;

pub use self::state::{TodoAction, TodoItem, TodoMutation, TodoState};
pub use self::store::{Latency, TodoStore};
