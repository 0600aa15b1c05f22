//! Per-invocation scratch space with guaranteed cleanup.
//!
//! Every artifact a run writes to durable storage is registered here,
//! including outputs of failed conversion attempts. Cleanup removes the
//! whole set exactly once after the run, on every exit path; removal
//! failures are logged and never escalated. File names carry a
//! per-invocation stem (UTC millis + short UUID) so concurrent runs
//! never collide.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::PipelineError;

/// Tracked temporary artifacts for one pipeline invocation
pub struct ScratchSpace {
    /// Directory all artifacts are written under
    dir: PathBuf,

    /// Unique per-run file-name stem
    stem: String,

    /// Every path handed out for this run
    tracked: Vec<PathBuf>,
}

impl ScratchSpace {
    /// Create a scratch space under `dir`, creating the directory if needed.
    pub async fn create(dir: &Path) -> Result<Self, PipelineError> {
        tokio::fs::create_dir_all(dir).await?;

        let stem = format!(
            "{}_{}",
            Utc::now().timestamp_millis(),
            &Uuid::new_v4().simple().to_string()[..8]
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            stem,
            tracked: Vec::new(),
        })
    }

    /// Reserve (and track) a path for an artifact this run may write.
    ///
    /// The path is tracked immediately so failed attempts that leave a
    /// partial file behind are still removed.
    pub fn reserve(&mut self, label: &str, extension: &str) -> PathBuf {
        let path = self
            .dir
            .join(format!("{}_{}.{}", label, self.stem, extension));
        self.tracked.push(path.clone());
        path
    }

    /// Write bytes to a fresh tracked artifact.
    pub async fn write(
        &mut self,
        label: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, PipelineError> {
        let path = self.reserve(label, extension);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "staged scratch artifact");
        Ok(path)
    }

    /// Paths registered so far.
    pub fn tracked(&self) -> &[PathBuf] {
        &self.tracked
    }

    /// Remove every tracked artifact. Best-effort: missing files are
    /// fine, removal failures are logged at warn and swallowed.
    pub async fn cleanup(&mut self) {
        for path in self.tracked.drain(..) {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(path = %path.display(), "removed scratch artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove scratch artifact"),
            }
        }
    }
}

impl Drop for ScratchSpace {
    /// Backstop for unwind paths; `cleanup()` drains the registry so a
    /// normal exit makes this a no-op.
    fn drop(&mut self) {
        for path in self.tracked.drain(..) {
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "failed to remove scratch artifact on drop");
                }
            }
        }
    }
}
