//! Local key/value storage holding persisted sessions.
//!
//! Values are raw strings, the way a browser's `localStorage` keeps them, so
//! a corrupted entry survives until a reader fails to parse it and removes it.
//!
//! ```text
//! .helios-storage.json
//! {
//!   "helios-session": "{\"accessCode\":\"DEMO_ACCESS_2024\",...}",
//!   "session_DEMO_ACCESS_2024": "{\"expiresAt\":1735689600000}"
//! }
//! ```

use super::error::GateError;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Key of the composed session written by the authentication flow.
pub const SESSION_KEY: &str = "helios-session";

/// Prefix of the per-code session markers read by the validator.
pub const CODE_SESSION_PREFIX: &str = "session_";

/// Per-code marker key for a normalized code.
#[must_use]
pub fn code_session_key(normalized_code: &str) -> String {
    format!("{CODE_SESSION_PREFIX}{normalized_code}")
}

/// Read the `expiresAt` field of a stored session value.
///
/// Returns `Ok(None)` when the field is absent, zero, or not a number.
///
/// # Errors
/// Returns an error if the stored value is not a JSON object.
pub fn stored_expiry(raw: &str) -> Result<Option<i64>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(<serde_json::Error as serde::de::Error>::custom(
            "stored session is not an object",
        ));
    }
    #[allow(clippy::cast_possible_truncation)]
    let expires_at = value
        .get("expiresAt")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)));
    Ok(expires_at.filter(|ms| *ms != 0))
}

pub trait LocalStorage: Send + Sync + fmt::Debug {
    /// # Errors
    /// Returns an error if the storage cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, GateError>;

    /// # Errors
    /// Returns an error if the storage cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<(), GateError>;

    /// # Errors
    /// Returns an error if the storage cannot be written.
    fn remove_item(&self, key: &str) -> Result<(), GateError>;

    /// # Errors
    /// Returns an error if the storage cannot be read.
    fn keys(&self) -> Result<Vec<String>, GateError>;
}

type Items = BTreeMap<String, String>;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<Items>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Items>, GateError> {
        self.items
            .lock()
            .map_err(|_| GateError::Poisoned("local storage"))
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, GateError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), GateError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), GateError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, GateError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

/// Storage persisted as a single JSON object on disk.
///
/// Every mutation rewrites the file through a temp file and a rename. A file
/// that is missing or not a JSON object of strings reads as empty.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read(&self) -> Result<Items, GateError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Items::new()),
            Err(e) => return Err(GateError::io(&self.path, e)),
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                debug!(
                    "discarding unreadable storage file {}: {e}",
                    self.path.display()
                );
                Ok(Items::new())
            }
        }
    }

    fn write(&self, items: &Items) -> Result<(), GateError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| GateError::io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(items)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, json).map_err(|e| GateError::io(&temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| GateError::io(&self.path, e))
    }

    fn modify(&self, f: impl FnOnce(&mut Items) -> bool) -> Result<(), GateError> {
        let _guard = self
            .guard
            .lock()
            .map_err(|_| GateError::Poisoned("file storage"))?;
        let mut items = self.read()?;
        if f(&mut items) {
            self.write(&items)?;
        }
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, GateError> {
        Ok(self.read()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), GateError> {
        self.modify(|items| {
            items.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), GateError> {
        self.modify(|items| items.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, GateError> {
        Ok(self.read()?.into_keys().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn code_session_key_uses_prefix() {
        assert_eq!(code_session_key("HELIOS2024VIP"), "session_HELIOS2024VIP");
    }

    #[test]
    fn stored_expiry_reads_the_field() {
        assert_eq!(stored_expiry("{\"expiresAt\":1234}").unwrap(), Some(1234));
        assert_eq!(stored_expiry("{\"expiresAt\":0}").unwrap(), None);
        assert_eq!(stored_expiry("{\"other\":true}").unwrap(), None);
        assert_eq!(stored_expiry("{\"expiresAt\":\"soon\"}").unwrap(), None);
        assert!(stored_expiry("{broken").is_err());
    }

    #[test]
    fn stored_expiry_rejects_non_objects() {
        for raw in ["null", "42", "\"text\"", "[1,2]", "true"] {
            assert!(stored_expiry(raw).is_err(), "{raw} should be unreadable");
        }
    }

    #[test]
    fn memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        storage.set_item("a", "1").unwrap();
        storage.set_item("b", "2").unwrap();
        assert_eq!(storage.get_item("a").unwrap().as_deref(), Some("1"));
        storage.remove_item("a").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
        assert_eq!(storage.keys().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn file_storage_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let storage = FileStorage::new(&path);
        storage.set_item(SESSION_KEY, "{\"a\":1}").unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(
            reopened.get_item(SESSION_KEY).unwrap().as_deref(),
            Some("{\"a\":1}")
        );
        assert!(!storage.temp_path().exists());

        reopened.remove_item(SESSION_KEY).unwrap();
        assert!(storage.keys().unwrap().is_empty());
    }

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.json"));
        assert!(storage.keys().unwrap().is_empty());
        assert_eq!(storage.get_item(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn corrupted_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(storage.keys().unwrap().is_empty());

        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
    }
}
