use crate::cli::globals::GlobalArgs;
use anyhow::Result;

/// Run one sweep over the storage file and print what was removed.
///
/// # Errors
/// Returns an error if the report cannot be serialized.
pub fn execute(globals: &GlobalArgs) -> Result<()> {
    let report = globals.gate().cleanup_expired_data();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gate::{FileStorage, LocalStorage};

    #[test]
    fn sweeps_expired_markers_from_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let storage = FileStorage::new(&path);
        storage
            .set_item("session_HELIOS2024VIP", "{\"expiresAt\":1}")
            .unwrap();

        execute(&GlobalArgs::new(&path)).unwrap();
        assert_eq!(storage.get_item("session_HELIOS2024VIP").unwrap(), None);
    }
}
