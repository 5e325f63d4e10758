//! File-backed storage
//!
//! Persists all keys in a single JSON file mapping keys to base64-encoded
//! values. All writes use atomic temp-file + rename to prevent corruption on
//! crash. A tokio Mutex serializes concurrent writers; reads clone the
//! in-memory map so they don't block on writes in progress.
//!
//! The file may hold authentication tokens, so it is created with 0600
//! permissions (owner read/write only) on Unix.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{Error, Result, Storage};

/// Durable storage backed by a single JSON file.
pub struct FileStorage {
    path: PathBuf,
    state: Mutex<HashMap<String, Vec<u8>>>,
}

impl FileStorage {
    /// Open storage at the given file path.
    ///
    /// If the file doesn't exist, creates it as `{}` so future opens don't
    /// need the cold-start path. A file that exists but cannot be parsed
    /// fails with `Error::Corrupt`; the caller decides whether to delete
    /// and start over.
    pub async fn open(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading storage file: {e}")))?;
            let encoded: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::Corrupt(format!("parsing storage file: {e}")))?;
            let mut entries = HashMap::with_capacity(encoded.len());
            for (key, value) in encoded {
                let bytes = STANDARD
                    .decode(&value)
                    .map_err(|e| Error::Corrupt(format!("decoding value for {key:?}: {e}")))?;
                entries.insert(key, bytes);
            }
            info!(path = %path.display(), entries = entries.len(), "opened storage file");
            entries
        } else {
            info!(path = %path.display(), "storage file not found, starting empty");
            let entries = HashMap::new();
            write_atomic(&path, &entries).await?;
            entries
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }
}

impl Storage for FileStorage {
    fn get<'a>(
        &'a self,
        key: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<u8>>>> + Send + 'a>> {
        Box::pin(async move { Ok(self.state.lock().await.get(key).cloned()) })
    }

    fn set<'a>(
        &'a self,
        key: &'a str,
        value: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            state.insert(key.to_owned(), value.to_vec());
            write_atomic(&self.path, &state).await
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.state.lock().await;
            if state.remove(key).is_some() {
                write_atomic(&self.path, &state).await?;
            }
            Ok(())
        })
    }
}

/// Write the full map to the storage file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. Sets file permissions to 0600 (owner read/write only) since
/// the file may contain token material.
async fn write_atomic(path: &Path, entries: &HashMap<String, Vec<u8>>) -> Result<()> {
    let encoded: HashMap<&str, String> = entries
        .iter()
        .map(|(key, value)| (key.as_str(), STANDARD.encode(value)))
        .collect();
    let json = serde_json::to_string_pretty(&encoded)
        .map_err(|e| Error::Io(format!("serializing storage file: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("storage path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".storage.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp storage file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting storage file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp storage file: {e}")))?;

    debug!(path = %path.display(), "persisted storage file");
    Ok(())
}
