//! Submission-scoped working directories.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Directory holding the source, build artifacts and I/O of one evaluation.
///
/// Named after the submission id, so a redelivered job reuses (after wiping)
/// the same path. The directory is removed when the guard is dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    /// Where the workspace of `submission_id` lives under `root`.
    pub fn path_for(root: &Path, submission_id: i32) -> PathBuf {
        root.join(format!("submission_{submission_id}"))
    }

    pub fn create(root: &Path, submission_id: i32) -> io::Result<Self> {
        let dir = Self::path_for(root, submission_id);
        if dir.exists() {
            // Left behind by a crashed worker.
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        debug!(path = %dir.display(), "Workspace created");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Write `content` to `file_name` inside the workspace.
    pub fn write_file(&self, file_name: &str, content: &str) -> io::Result<PathBuf> {
        let path = self.dir.join(file_name);
        fs::write(&path, content)?;
        Ok(path)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!(path = %self.dir.display(), "Workspace removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.dir.display(), error = %e, "Failed to remove workspace"),
        }
    }
}
