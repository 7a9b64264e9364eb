//! Tether HTTP client layer
//!
//! A request gateway that attaches bearer credentials, transparently renews
//! an expired access token once, and encodes multipart uploads. Credentials
//! and navigation are injected, so the same gateway runs against a file-backed
//! store in the CLI and an in-memory store in tests.

pub mod client;

pub use client::{
    ClientError, CredentialStore, FilePart, FileCredentialStore, Gateway, GatewayBuilder,
    LogNavigator, MemoryCredentialStore, Navigator, RequestDescriptor, TokenPair, UploadProgress,
};
