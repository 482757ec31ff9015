use crate::gate::{FileStorage, Gate, NoDelay};
use std::path::PathBuf;
use std::sync::Arc;

/// Options shared by every subcommand that touches the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    pub storage_path: PathBuf,
    pub no_delay: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            no_delay: false,
        }
    }

    #[must_use]
    pub fn with_no_delay(mut self, no_delay: bool) -> Self {
        self.no_delay = no_delay;
        self
    }

    /// Gate over the storage file. Limiter state lives as long as the gate.
    #[must_use]
    pub fn gate(&self) -> Gate {
        let builder = Gate::builder(Arc::new(FileStorage::new(&self.storage_path)));
        if self.no_delay {
            builder.delay(Arc::new(NoDelay)).build()
        } else {
            builder.build()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(".helios-storage.json");
        assert_eq!(args.storage_path, PathBuf::from(".helios-storage.json"));
        assert!(!args.no_delay);
        assert!(args.with_no_delay(true).no_delay);
    }
}
