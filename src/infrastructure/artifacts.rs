use crate::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Creates the transient files handed to the engine.
///
/// Each file gets a unique generated name inside the scratch directory, so
/// concurrent attempts never collide and no locking is needed.
#[derive(Debug, Clone)]
pub struct TempArtifactStore {
    scratch_dir: PathBuf,
}

impl TempArtifactStore {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Writes `content` to a new `<prefix>*.ini` file.
    pub fn materialize(&self, prefix: &str, content: &str) -> Result<TempArtifact> {
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".ini")
            .tempfile_in(&self.scratch_dir)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        let path = file.into_temp_path();
        debug!(path = %path.display(), "materialized artifact");
        Ok(TempArtifact { path: Some(path) })
    }
}

/// A file owned by one request attempt.
///
/// Released exactly once: by [`TempArtifact::release`] or, on any other exit
/// path, when dropped.
#[derive(Debug)]
pub struct TempArtifact {
    path: Option<TempPath>,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .unwrap_or_else(|| Path::new(""))
    }

    /// Deletes the file. Failures are logged and otherwise ignored.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let shown = path.display().to_string();
        match path.close() {
            Ok(()) => debug!(path = %shown, "released artifact"),
            Err(err) => warn!(path = %shown, error = %err, "artifact cleanup failed"),
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        self.remove();
    }
}
