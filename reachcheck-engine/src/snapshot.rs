//! Snapshot persistence
//!
//! Append-only directory of pretty-printed JSON files keyed by request id.
//! Repeated collection attempts for the same business never overwrite prior
//! evidence, and a saved snapshot must remain valid input for the rendering
//! collaborator indefinitely.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use reachcheck_common::{Error, Result};

use crate::models::Snapshot;

pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open (creating if needed) the snapshot directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist one snapshot. Refuses to touch an existing file, so the store
    /// is append-only by construction.
    pub fn save(&self, snapshot: &Snapshot) -> Result<PathBuf> {
        let filename = sanitize(&format!(
            "{}_{}.json",
            snapshot.request_id,
            snapshot.saved_at.format("%Y%m%d_%H%M%S")
        ));
        let path = self.dir.join(filename);

        let mut file =
            OpenOptions::new().write(true).create_new(true).open(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    Error::Snapshot(format!("refusing to overwrite {}", path.display()))
                } else {
                    Error::Io(e)
                }
            })?;
        let json = serde_json::to_string_pretty(snapshot)?;
        file.write_all(json.as_bytes())?;

        tracing::info!(path = %path.display(), "Snapshot saved");
        Ok(path)
    }

    /// Load a previously saved snapshot.
    pub fn load(&self, path: &Path) -> Result<Snapshot> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Most recent snapshot file whose name starts with the given key
    /// (typically a request id).
    pub fn find_latest(&self, key: &str) -> Result<Option<PathBuf>> {
        let prefix = sanitize(key);
        let mut matches: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(prefix.as_str()))
            })
            .collect();
        matches.sort();
        Ok(matches.pop())
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c == '/' || c == '\\' || c.is_whitespace() { '_' } else { c })
        .collect()
}
