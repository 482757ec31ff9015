//! Keyed in-process state used by the limiter.

use super::error::GateError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// Get/set/delete store for limiter state, keyed by normalized code.
pub trait StateStore<V>: Send + Sync + fmt::Debug {
    /// # Errors
    /// Returns an error if the backing state cannot be read.
    fn get(&self, key: &str) -> Result<Option<V>, GateError>;

    /// # Errors
    /// Returns an error if the backing state cannot be written.
    fn set(&self, key: &str, value: V) -> Result<(), GateError>;

    /// # Errors
    /// Returns an error if the backing state cannot be written.
    fn delete(&self, key: &str) -> Result<(), GateError>;

    /// Snapshot of every entry, in no particular order.
    ///
    /// # Errors
    /// Returns an error if the backing state cannot be read.
    fn entries(&self) -> Result<Vec<(String, V)>, GateError>;
}

/// `HashMap` behind a mutex. Each instance is isolated.
#[derive(Debug)]
pub struct MemoryStore<V> {
    name: &'static str,
    entries: Mutex<HashMap<String, V>>,
}

impl<V> MemoryStore<V> {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, V>>, GateError> {
        self.entries.lock().map_err(|_| GateError::Poisoned(self.name))
    }
}

impl<V> StateStore<V> for MemoryStore<V>
where
    V: Clone + Send + fmt::Debug,
{
    fn get(&self, key: &str) -> Result<Option<V>, GateError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: V) -> Result<(), GateError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), GateError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(String, V)>, GateError> {
        Ok(self
            .lock()?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete() {
        let store: MemoryStore<u64> = MemoryStore::new("usage");
        assert_eq!(store.get("A").unwrap(), None);

        store.set("A", 3).unwrap();
        store.set("B", 7).unwrap();
        assert_eq!(store.get("A").unwrap(), Some(3));

        store.delete("A").unwrap();
        assert_eq!(store.get("A").unwrap(), None);
        assert_eq!(store.entries().unwrap(), vec![("B".to_string(), 7)]);
    }

    #[test]
    fn instances_do_not_share_state() {
        let first: MemoryStore<u64> = MemoryStore::new("usage");
        let second: MemoryStore<u64> = MemoryStore::new("usage");
        first.set("A", 1).unwrap();
        assert_eq!(second.get("A").unwrap(), None);
    }
}
