//! Tracing setup shared by the Tether binaries
//!
//! Library crates only emit events through the `tracing` macros; installing a
//! subscriber is left to the binary via [`init::init_tracing`].

pub mod config;
pub mod init;

pub use self::config::{InstrumentationConfig, LogFormat};
pub use self::init::init_tracing;
