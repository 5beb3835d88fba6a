//! Credential storage shared by the client and anything that needs the session
//!
//! The store is the single source of truth for the current credential. It is
//! read before every outbound request and written only by login, a successful
//! refresh, and logout or a failed refresh. Absence is a normal state, so no
//! operation here returns an error.

use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

pub use crate::config::TOKEN_KEY;

/// Storage for the access credential and an optional refresh credential
pub trait TokenStore: Send + Sync {
    /// Current access credential, if any
    fn get(&self) -> Option<String>;

    /// Replace the current access credential
    fn set(&self, token: String);

    /// Refresh credential, when the backend issued one separately
    fn get_refresh(&self) -> Option<String>;

    /// Replace the refresh credential
    fn set_refresh(&self, token: String);

    /// Forget both credentials
    fn clear(&self);

    /// Credential to present to the refresh endpoint.
    ///
    /// Backends that only issue a single token expect the access credential
    /// back, so it is used when no refresh credential is stored.
    fn refresh_credential(&self) -> Option<String> {
        self.get_refresh().or_else(|| self.get())
    }
}

/// Persisted layout of the session; the access credential sits under
/// [`TOKEN_KEY`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    #[serde(rename = "token", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(
        rename = "refresh_token",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub refresh_token: Option<String>,
}

/// In-process token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: RwLock<StoredSession>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds an access credential
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            inner: RwLock::new(StoredSession {
                token: Some(token.into()),
                refresh_token: None,
            }),
        }
    }

    fn snapshot(&self) -> StoredSession {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut StoredSession)) -> StoredSession {
        let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut session);
        session.clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.snapshot().token
    }

    fn set(&self, token: String) {
        self.update(|s| s.token = Some(token));
    }

    fn get_refresh(&self) -> Option<String> {
        self.snapshot().refresh_token
    }

    fn set_refresh(&self, token: String) {
        self.update(|s| s.refresh_token = Some(token));
    }

    fn clear(&self) {
        self.update(|s| *s = StoredSession::default());
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileTokenStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::{MemoryTokenStore, StoredSession, TokenStore};
    use std::path::{Path, PathBuf};
    use tracing::{debug, warn};

    /// Token store persisted to a JSON file so the session survives restarts.
    ///
    /// The in-memory copy stays authoritative for the running process; write
    /// failures are logged and otherwise ignored.
    #[derive(Debug)]
    pub struct FileTokenStore {
        path: PathBuf,
        memory: MemoryTokenStore,
    }

    impl FileTokenStore {
        /// Open the store at `path`, loading any previously persisted session
        pub fn open(path: impl Into<PathBuf>) -> Self {
            let path = path.into();
            let session = match std::fs::read_to_string(&path) {
                Ok(content) => serde_json::from_str::<StoredSession>(&content).unwrap_or_else(|e| {
                    warn!(path = %path.display(), "Ignoring unreadable session file: {e}");
                    StoredSession::default()
                }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredSession::default(),
                Err(e) => {
                    warn!(path = %path.display(), "Failed to read session file: {e}");
                    StoredSession::default()
                }
            };

            debug!(
                path = %path.display(),
                has_token = session.token.is_some(),
                "Opened session store"
            );

            let memory = MemoryTokenStore::new();
            memory.update(|s| *s = session);
            Self { path, memory }
        }

        /// Default session file location inside the platform data directory
        pub fn default_path() -> PathBuf {
            directories::ProjectDirs::from("dev", "pledge", "pledge")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".pledge"))
                .join("session.json")
        }

        /// Location of the backing file
        pub fn path(&self) -> &Path {
            &self.path
        }

        fn persist(&self, session: &StoredSession) {
            if let Err(e) = write_session(&self.path, session) {
                warn!(path = %self.path.display(), "Failed to persist session: {e}");
            }
        }
    }

    fn write_session(path: &Path, session: &StoredSession) -> std::io::Result<()> {
        if session.token.is_none() && session.refresh_token.is_none() {
            return match std::fs::remove_file(path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            };
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(session)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)
    }

    impl TokenStore for FileTokenStore {
        fn get(&self) -> Option<String> {
            self.memory.get()
        }

        fn set(&self, token: String) {
            let session = self.memory.update(|s| s.token = Some(token));
            self.persist(&session);
        }

        fn get_refresh(&self) -> Option<String> {
            self.memory.get_refresh()
        }

        fn set_refresh(&self, token: String) {
            let session = self.memory.update(|s| s.refresh_token = Some(token));
            self.persist(&session);
        }

        fn clear(&self) {
            let session = self.memory.update(|s| *s = StoredSession::default());
            self.persist(&session);
        }
    }
}
