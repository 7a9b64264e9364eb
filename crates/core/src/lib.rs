//! Tether core types and utilities

pub mod config;
pub mod error;

#[cfg(feature = "tracing")]
pub mod tracing;

pub use crate::config::{DEFAULT_LOGIN_ROUTE, EndpointConfig};
pub use crate::error::{CoreError, CoreResult};
