//! In-progress local writes
//!
//! Files are written as `{dest}.part` and renamed into place once complete.
//! The partial file belongs to a [`PartialFile`] value, so a write that fails
//! or is cancelled mid-stream never leaves it behind.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct PartialFile {
    path: PathBuf,
    dest: PathBuf,
    committed: bool,
}

impl PartialFile {
    /// Claim `{dest}.part`. Nothing is created on disk until the caller writes it.
    pub fn beside(dest: &Path) -> Self {
        let mut raw: OsString = dest.as_os_str().to_owned();
        raw.push(".part");
        Self {
            path: PathBuf::from(raw),
            dest: dest.to_path_buf(),
            committed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the finished file over `dest`.
    ///
    /// On error the partial file is still removed when `self` drops.
    pub async fn commit(mut self) -> std::io::Result<PathBuf> {
        tokio::fs::rename(&self.path, &self.dest).await?;
        self.committed = true;
        Ok(self.dest.clone())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to remove partial file");
            }
        }
    }
}
