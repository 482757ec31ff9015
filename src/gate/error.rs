use std::path::PathBuf;

/// Internal faults raised by gate storage and state.
///
/// Public gate operations never surface these; they are logged and folded
/// into the matching "service unavailable" result.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode state: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("state lock poisoned: {0}")]
    Poisoned(&'static str),
}

impl GateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = GateError::io(
            "/tmp/helios.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/helios.json"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn poisoned_error_names_the_lock() {
        assert_eq!(
            GateError::Poisoned("usage").to_string(),
            "state lock poisoned: usage"
        );
    }
}
