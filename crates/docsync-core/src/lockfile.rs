use anyhow::Context;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock that marks a sync as in flight across processes.
/// The holder's pid is written into the file for diagnostics.
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    file: File,
}

impl LockFile {
    pub fn try_acquire(path: &Path) -> anyhow::Result<Option<Self>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("create lockfile directory")?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("open lockfile {}", path.display()))?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                record_holder(&mut file).context("record lock holder")?;
                Ok(Some(Self {
                    path: path.to_path_buf(),
                    file,
                }))
            }
            Err(err) if is_lock_held(&err) => Ok(None),
            Err(err) => Err(err).context("lock file exclusively"),
        }
    }

    /// Best effort: the pid last written by a holder, if readable.
    pub fn holder(path: &Path) -> Option<u32> {
        fs::read_to_string(path)
            .ok()
            .and_then(|contents| contents.trim().parse().ok())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        let _ = self.file.unlock();
    }
}

fn record_holder(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{}", std::process::id())?;
    file.flush()
}

fn is_lock_held(err: &std::io::Error) -> bool {
    if err.kind() == std::io::ErrorKind::WouldBlock {
        return true;
    }
    matches!(err.raw_os_error(), Some(33))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lockfile_prevents_double_lock() {
        let tmp = TempDir::new().unwrap();
        let lock_path = tmp.path().join("sync.lock");
        let first = LockFile::try_acquire(&lock_path).unwrap();
        assert!(first.is_some());
        let second = LockFile::try_acquire(&lock_path).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn lock_is_released_on_drop() {
        let tmp = TempDir::new().unwrap();
        let lock_path = tmp.path().join("run").join("sync.lock");
        let first = LockFile::try_acquire(&lock_path).unwrap().unwrap();
        assert_eq!(first.path(), lock_path.as_path());
        drop(first);
        assert!(LockFile::try_acquire(&lock_path).unwrap().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn holder_pid_is_recorded() {
        let tmp = TempDir::new().unwrap();
        let lock_path = tmp.path().join("sync.lock");
        let _lock = LockFile::try_acquire(&lock_path).unwrap().unwrap();
        assert_eq!(LockFile::holder(&lock_path), Some(std::process::id()));
    }
}
