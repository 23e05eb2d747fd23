//! JSON file-backed snapshot store.

use handshake_types::{GraphSnapshot, SnapshotError, SnapshotStore};
use std::path::{Path, PathBuf};

/// Stores the snapshot as one JSON document. Writes go to a sibling temp file
/// that is renamed over the target, so a crash never leaves a torn snapshot.
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

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
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn save(&self, snapshot: &GraphSnapshot) -> Result<(), SnapshotError> {
        let bytes =
            serde_json::to_vec(snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))?;
        let tmp = self.temp_path();
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(
            path = %self.path.display(),
            users = snapshot.users.len(),
            "snapshot saved"
        );
        Ok(())
    }

    fn load(&self) -> Result<Option<GraphSnapshot>, SnapshotError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot =
            serde_json::from_slice(&bytes).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        Ok(Some(snapshot))
    }
}
