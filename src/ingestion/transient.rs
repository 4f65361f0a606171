//! Ownership of the temporary CSV produced when a workbook is normalized.
//!
//! A [`TransientFile`] deletes its file exactly once: either when [`TransientFile::remove`] is
//! called or when the guard is dropped. Deletion failures are logged and swallowed.

use std::fmt;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

/// Scoped handle to a transient file on disk.
pub struct TransientFile {
    path: PathBuf,
    temp: Option<TempPath>,
}

impl TransientFile {
    pub(crate) fn new(temp: TempPath) -> Self {
        Self {
            path: temp.to_path_buf(),
            temp: Some(temp),
        }
    }

    /// Path of the transient file (it may already have been removed).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` until the file has been removed.
    pub fn is_live(&self) -> bool {
        self.temp.is_some()
    }

    /// Delete the file now. Subsequent calls (and the eventual drop) are no-ops.
    pub fn remove(&mut self) {
        let Some(temp) = self.temp.take() else {
            return;
        };
        match temp.close() {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed transient file"),
            Err(err) => tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "failed to remove transient file"
            ),
        }
    }
}

impl fmt::Debug for TransientFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransientFile")
            .field("path", &self.path)
            .field("live", &self.is_live())
            .finish()
    }
}

impl Drop for TransientFile {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::TransientFile;

    fn make_transient(dir: &std::path::Path) -> TransientFile {
        let file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile_in(dir)
            .unwrap();
        TransientFile::new(file.into_temp_path())
    }

    #[test]
    fn remove_deletes_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = make_transient(dir.path());
        let path = t.path().to_path_buf();
        assert!(path.exists());

        t.remove();
        assert!(!path.exists());
        assert!(!t.is_live());
        t.remove();
    }

    #[test]
    fn drop_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let t = make_transient(dir.path());
        let path = t.path().to_path_buf();
        drop(t);
        assert!(!path.exists());
    }

    #[test]
    fn remove_swallows_already_deleted_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = make_transient(dir.path());
        std::fs::remove_file(t.path()).unwrap();
        t.remove();
        assert!(!t.is_live());
    }
}
