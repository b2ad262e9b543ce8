use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const LOCK_FILE_NAME: &str = "cores.txt.lock";
pub const CORES_FILE_NAME: &str = "cores.txt";

/// The pair of coordination files CPU-bound tasks use to share cores.
///
/// Only their existence is managed here; the workload program locks and reads them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockFiles {
    pub lock: PathBuf,
    pub cores: PathBuf,
}

impl LockFiles {
    pub fn in_dir(dir: &Path) -> Self {
        LockFiles { lock: dir.join(LOCK_FILE_NAME), cores: dir.join(CORES_FILE_NAME) }
    }

    /// Creates the directory and both files, leaving existing files untouched.
    pub fn create(&self) -> Result<()> {
        for path in [&self.lock, &self.cores] {
            touch(path)?;
        }
        log::debug!("Lock files ready: '{}' and '{}'", self.lock.display(), self.cores.display());
        Ok(())
    }

    pub fn arguments(&self) -> Vec<String> {
        vec![
            "--path-lock".to_string(),
            self.lock.display().to_string(),
            "--path-cores".to_string(),
            self.cores.display().to_string(),
        ]
    }
}

/// Creates `path` (and its parent directories) as an empty file if it does not exist.
pub fn touch(path: &Path) -> Result<()> {
    let fs_error = |e: std::io::Error| Error::FilesystemError { path: path.to_path_buf(), reason: e.to_string() };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(fs_error)?;
    }
    OpenOptions::new().create(true).append(true).open(path).map_err(fs_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_makes_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        let lock_files = LockFiles::in_dir(&dir.path().join("locks"));
        lock_files.create().unwrap();

        assert_eq!(fs::read(&lock_files.lock).unwrap().len(), 0);
        assert_eq!(fs::read(&lock_files.cores).unwrap().len(), 0);
    }

    #[test]
    fn test_create_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let lock_files = LockFiles::in_dir(dir.path());
        fs::write(&lock_files.cores, "3\n").unwrap();

        lock_files.create().unwrap();
        assert_eq!(fs::read_to_string(&lock_files.cores).unwrap(), "3\n");
    }

    #[test]
    fn test_create_below_a_file_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();

        let result = LockFiles::in_dir(&blocker.join("locks")).create();
        assert!(matches!(result, Err(Error::FilesystemError { .. })));
    }
}
