use std::fs::{File, OpenOptions};
use std::io;
use std::path::PathBuf;
use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::layout::StorageLayout;

/// Exclusive hold on a dataset directory, released on drop.
///
/// `flock` locks belong to the open file description, so a second
/// `Dataset::open` on the same directory fails even inside one process.
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    pub fn acquire(storage: &StorageLayout) -> Result<Self> {
        let path = storage.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        flock(&file, Mode::Exclusive).map_err(|err| {
            let context = if err.kind() == io::ErrorKind::WouldBlock {
                format!("{} is held by another dataset handle", path.display())
            } else {
                format!("cannot lock {}: {}", path.display(), err)
            };
            Error::new(ErrorKind::Io, context)
        })?;

        tracing::trace!(path = %path.display(), "locked dataset directory");
        Ok(FileLock { file, path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(err) = flock(&self.file, Mode::Release) {
            tracing::warn!(path = %self.path.display(), %err, "failed to release dataset lock");
        }
    }
}

enum Mode {
    Exclusive,
    Release,
}

#[cfg(unix)]
fn flock(file: &File, mode: Mode) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let op = match mode {
        Mode::Exclusive => libc::LOCK_EX | libc::LOCK_NB,
        Mode::Release => libc::LOCK_UN,
    };
    // SAFETY: the descriptor stays owned by `file` for the whole call.
    let rc = unsafe { libc::flock(file.as_raw_fd(), op) };
    if rc == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
}

#[cfg(not(unix))]
fn flock(_file: &File, _mode: Mode) -> io::Result<()> {
    Ok(())
}
