//! Persisted storage for the single credential token.
//!
//! Exactly one token lives in one well-known slot. Nothing about its expiry
//! is stored; the backend alone decides whether it is still good.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name
const SERVICE_NAME: &str = "pawhaven";

/// Keychain account the token is filed under
const TOKEN_KEY: &str = "token";

/// Durable storage for the bearer token.
///
/// Errors mean the storage itself is broken (disk, keychain) and end the
/// session flow; an empty store is `Ok(None)`, never an error.
pub trait TokenStore: Send + Sync {
    /// Store `token`, replacing whatever was there.
    fn save(&self, token: &str) -> Result<()>;

    /// The stored token, if any.
    fn read(&self) -> Result<Option<String>>;

    /// Remove the token. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<()>;

    /// The stored token if it can be presented as a credential. An empty
    /// string counts as no token.
    fn current_token(&self) -> Result<Option<String>> {
        Ok(self.read()?.filter(|token| !token.is_empty()))
    }
}

// ============================================================================
// File
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: String,
}

/// Token kept as JSON in the cache directory.
pub struct FileTokenStore {
    cache_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    fn write_file(path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, token: &str) -> Result<()> {
        let contents = serde_json::to_string_pretty(&SessionFile {
            token: token.to_string(),
        })?;
        Self::write_file(&self.path(), &contents)?;
        debug!(path = %self.path().display(), "Token saved");
        Ok(())
    }

    fn read(&self) -> Result<Option<String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let file: SessionFile =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(file.token))
    }

    fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
            debug!(path = %path.display(), "Token cleared");
        }
        Ok(())
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// Token kept in the OS keychain.
///
/// One `Entry` is held for the life of the store, so every operation goes
/// through the same credential.
pub struct KeyringTokenStore {
    entry: Entry,
}

impl KeyringTokenStore {
    pub fn new() -> Result<Self> {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Result<Self> {
        let entry = Entry::new(service, TOKEN_KEY).context("Failed to create keyring entry")?;
        debug!(service, "Keychain token store ready");
        Ok(Self { entry })
    }
}

impl TokenStore for KeyringTokenStore {
    fn save(&self, token: &str) -> Result<()> {
        self.entry
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn read(&self) -> Result<Option<String>> {
        match self.entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(anyhow!(e).context("Failed to retrieve token from keychain")),
        }
    }

    fn clear(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(anyhow!(e).context("Failed to delete token from keychain")),
        }
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Token kept for the life of the process only.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    fn slot(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.token
            .lock()
            .map_err(|_| anyhow!("Token store lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &str) -> Result<()> {
        *self.slot()? = Some(token.to_string());
        Ok(())
    }

    fn read(&self) -> Result<Option<String>> {
        Ok(self.slot()?.clone())
    }

    fn clear(&self) -> Result<()> {
        *self.slot()? = None;
        Ok(())
    }
}
