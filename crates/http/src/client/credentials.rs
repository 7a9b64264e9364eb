//! Access/refresh token storage
//!
//! Tokens are opaque strings: nothing here parses, validates, or expires
//! them. A store is shared by handle, so a write through one handle is seen by
//! every later read through any other.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::CredentialError;

/// The access/refresh pair of one client session
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    /// Pair with both tokens present
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

// Token values stay out of logs
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Client-scoped slot for the session's tokens
pub trait CredentialStore: Send + Sync {
    /// Current pair; an unreadable store reads as empty
    fn get(&self) -> TokenPair;

    /// Replace both tokens
    fn save(&self, access_token: &str, refresh_token: &str) -> Result<(), CredentialError>;

    /// Forget both tokens
    fn clear(&self) -> Result<(), CredentialError>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: ArcSwap<TokenPair>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a session, e.g. right after login
    pub fn with_tokens(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            slot: ArcSwap::from_pointee(TokenPair::new(access_token, refresh_token)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> TokenPair {
        TokenPair::clone(&self.slot.load())
    }

    fn save(&self, access_token: &str, refresh_token: &str) -> Result<(), CredentialError> {
        self.slot
            .store(Arc::new(TokenPair::new(access_token, refresh_token)));
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        self.slot.store(Arc::new(TokenPair::default()));
        Ok(())
    }
}

/// On-disk layout: two named slots
#[derive(Debug, Default, Serialize, Deserialize)]
struct Slots {
    #[serde(rename = "accT", default, skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(rename = "rshT", default, skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
}

/// File-backed store that survives process restarts
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Default file name inside a data directory
    pub const FILE_NAME: &'static str = "credentials.json";

    /// Store at a specific path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<dir>/credentials.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::with_path(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_slots(&self) -> Result<Slots, CredentialError> {
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> TokenPair {
        match self.read_slots() {
            Ok(slots) => TokenPair {
                access_token: slots.access,
                refresh_token: slots.refresh,
            },
            Err(err) => {
                debug!(path = %self.path.display(), "No stored credentials: {err}");
                TokenPair::default()
            }
        }
    }

    fn save(&self, access_token: &str, refresh_token: &str) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let slots = Slots {
            access: Some(access_token.to_string()),
            refresh: Some(refresh_token.to_string()),
        };
        let data = serde_json::to_string_pretty(&slots)?;
        std::fs::write(&self.path, data)?;

        // Owner-only, the file holds bearer credentials
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_save_then_clear() {
        let store = MemoryCredentialStore::new();
        assert!(store.get().is_empty());

        store.save("access-1", "refresh-1").unwrap();
        assert_eq!(store.get(), TokenPair::new("access-1", "refresh-1"));

        store.clear().unwrap();
        assert!(store.get().is_empty());
    }

    #[test]
    fn memory_store_is_shared_between_handles() {
        let store = Arc::new(MemoryCredentialStore::with_tokens("a", "r"));
        let other: Arc<dyn CredentialStore> = store.clone();

        other.save("a2", "r").unwrap();
        assert_eq!(store.get().access_token.as_deref(), Some("a2"));
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_dir(dir.path().join("nested"));
        assert!(store.get().is_empty());

        store.save("access-1", "refresh-1").unwrap();
        let reopened = FileCredentialStore::with_path(store.path());
        assert_eq!(reopened.get(), TokenPair::new("access-1", "refresh-1"));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"accT\""));
        assert!(raw.contains("\"rshT\""));

        store.clear().unwrap();
        assert!(store.get().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn file_store_clear_without_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        store.clear().unwrap();
    }

    #[test]
    fn file_store_treats_garbage_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        std::fs::write(store.path(), "not json").unwrap();
        assert!(store.get().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        store.save("a", "r").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn debug_output_hides_tokens() {
        let pair = TokenPair::new("secret-access", "secret-refresh");
        let shown = format!("{pair:?}");
        assert!(!shown.contains("secret"));
        assert!(shown.contains("<redacted>"));
    }
}
