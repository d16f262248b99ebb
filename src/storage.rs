//! Key-value persistence trait and built-in backends.
//!
//! The store uses this layer for exactly one thing today -- the persisted
//! session under [`crate::observer::SESSION_KEY`] -- but the contract is a
//! plain string-to-string map so other slices of state could be persisted
//! the same way.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A durable string key to string value map.
///
/// `get` of an absent key returns `Ok(None)`; `delete` of an absent key is
/// not an error. Implementations must survive process restarts to be useful
/// for session persistence, but an in-memory implementation is provided for
/// tests and fixtures.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` for unexpected backend failures (not for a
    /// missing key).
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if the write fails.
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Remove the value stored under `key`. Absent keys are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if the removal fails for a reason other than
    /// the key being absent.
    fn delete(&self, key: &str) -> io::Result<()>;
}

/// In-memory [`KeyValueStore`] backed by a `Mutex<HashMap>`.
///
/// Values do not survive process restarts; intended for tests and for
/// running the store without durable persistence.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recover from a poisoned lock.
    ///
    /// The map holds plain strings, so state is valid even if a panicking
    /// thread held the lock mid-operation.
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// File-backed [`KeyValueStore`]: one file per key under a base directory.
///
/// Keys are sanitized into filenames (non-alphanumeric characters other
/// than `-`, `_`, and `.` become `_`). Writes are atomic via a temp-rename
/// pattern so readers never observe a partially-written value.
#[derive(Debug, Clone)]
pub struct FileKv {
    base_dir: PathBuf,
}

impl FileKv {
    /// Create a store rooted at `base_dir`.
    ///
    /// The directory does not need to exist yet; it is created lazily on
    /// the first `set`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Returns the root directory of this store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Compute the filesystem path for a key.
    fn key_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_dir.join(format!("{name}.kv"))
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        let path = self.key_path(key);
        let tmp_path = path.with_extension("kv.tmp");
        std::fs::write(&tmp_path, value)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_kv_roundtrip() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("session").expect("get should succeed"), None);

        kv.set("session", "{\"id\":\"u-1\"}")
            .expect("set should succeed");
        assert_eq!(
            kv.get("session").expect("get should succeed").as_deref(),
            Some("{\"id\":\"u-1\"}")
        );

        kv.delete("session").expect("delete should succeed");
        assert_eq!(kv.get("session").expect("get should succeed"), None);
    }

    #[test]
    fn memory_kv_set_replaces_value() {
        let kv = MemoryKv::new();
        kv.set("k", "one").expect("set should succeed");
        kv.set("k", "two").expect("set should succeed");
        assert_eq!(
            kv.get("k").expect("get should succeed").as_deref(),
            Some("two")
        );
    }

    #[test]
    fn memory_kv_delete_absent_key_is_noop() {
        let kv = MemoryKv::new();
        kv.delete("never-set").expect("delete should succeed");
    }

    #[test]
    fn file_kv_roundtrip() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let kv = FileKv::new(tmp.path());

        assert_eq!(kv.get("session").expect("get should succeed"), None);

        kv.set("session", "hello").expect("set should succeed");
        assert_eq!(
            kv.get("session").expect("get should succeed").as_deref(),
            Some("hello")
        );

        kv.delete("session").expect("delete should succeed");
        assert_eq!(kv.get("session").expect("get should succeed"), None);
    }

    #[test]
    fn file_kv_survives_reopen() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        FileKv::new(tmp.path())
            .set("session", "persisted")
            .expect("set should succeed");

        // A fresh handle over the same directory sees the value.
        let kv = FileKv::new(tmp.path());
        assert_eq!(
            kv.get("session").expect("get should succeed").as_deref(),
            Some("persisted")
        );
    }

    #[test]
    fn file_kv_sanitizes_keys_into_filenames() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let kv = FileKv::new(tmp.path());

        kv.set("campusconnect/session user", "v")
            .expect("set should succeed");
        assert_eq!(
            kv.get("campusconnect/session user")
                .expect("get should succeed")
                .as_deref(),
            Some("v")
        );

        // The stored file must live directly under the base dir, not in a
        // subdirectory carved out of the key.
        let entries: Vec<_> = std::fs::read_dir(tmp.path())
            .expect("read_dir should succeed")
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn file_kv_delete_absent_key_is_noop() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let kv = FileKv::new(tmp.path());
        kv.delete("never-set").expect("delete should succeed");
    }

    #[test]
    fn file_kv_write_leaves_no_temp_file() {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let kv = FileKv::new(tmp.path());
        kv.set("session", "v").expect("set should succeed");

        let leftover = std::fs::read_dir(tmp.path())
            .expect("read_dir should succeed")
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().ends_with(".tmp"));
        assert!(!leftover, "temp file should not exist after a successful set");
    }
}
