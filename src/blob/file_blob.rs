use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use crate::blob::{check_bounds, data_start, grown_capacity, Blob};
use crate::core::error::{Error, ErrorKind, Result};

struct FileState {
    file: Option<File>,     // None once closed
    capacity: u64,
    next: u64,
}

impl FileState {
    fn file(&mut self) -> Result<&mut File> {
        self.file.as_mut()
            .ok_or_else(|| Error::new(ErrorKind::InvalidState, "blob is closed".to_string()))
    }

    fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<()> {
        check_bounds(pos, buf.len() as u64, self.capacity)?;
        let file = self.file()?;
        file.seek(SeekFrom::Start(pos))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, pos: u64, data: &[u8]) -> Result<()> {
        check_bounds(pos, data.len() as u64, self.capacity)?;
        let file = self.file()?;
        file.seek(SeekFrom::Start(pos))?;
        file.write_all(data)?;
        Ok(())
    }
}

/// Blob backed by ordinary positioned file I/O.
pub struct FileBlob {
    path: PathBuf,
    state: Mutex<FileState>,
    increment: u64,
    is_new: bool,
    growth_events: AtomicU64,
}

impl FileBlob {
    pub fn open<P: AsRef<Path>>(path: P, region_count: usize, increment: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let mut capacity = file.metadata()?.len();
        let is_new = capacity == 0;
        if is_new {
            file.set_len(increment)?;
            capacity = increment;
        }

        let mut state = FileState { file: Some(file), capacity, next: 0 };
        let next = if is_new {
            let next = data_start(region_count);
            state.write_at(0, &next.to_le_bytes())?;
            next
        } else {
            let mut buf = [0u8; 8];
            state.read_at(0, &mut buf)?;
            u64::from_le_bytes(buf)
        };
        state.next = next;

        tracing::debug!(path = %path.display(), capacity, next = state.next, is_new, "opened file blob");

        Ok(FileBlob {
            path,
            state: Mutex::new(state),
            increment,
            is_new,
            growth_events: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Blob for FileBlob {
    fn alloc(&self, bytes: u64) -> Result<u64> {
        let mut state = self.state.lock();
        state.file()?;

        let total = state.next + bytes;
        if total > state.capacity {
            let new_capacity = grown_capacity(state.capacity, total, self.increment);
            tracing::debug!(
                path = %self.path.display(),
                from = state.capacity,
                to = new_capacity,
                "growing file blob"
            );
            let file = state.file()?;
            file.sync_data()?;
            file.set_len(new_capacity)?;
            state.capacity = new_capacity;
            self.growth_events.fetch_add(1, Ordering::SeqCst);
        }

        let pos = state.next;
        state.next = total;
        state.write_at(0, &total.to_le_bytes())?;

        Ok(pos)
    }

    fn read_at(&self, pos: u64, buf: &mut [u8]) -> Result<()> {
        self.state.lock().read_at(pos, buf)
    }

    fn write_at(&self, pos: u64, data: &[u8]) -> Result<()> {
        self.state.lock().write_at(pos, data)
    }

    fn copy(&self, from: u64, to: u64, len: u64) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let mut state = self.state.lock();
        let mut data = vec![0u8; len as usize];
        state.read_at(from, &mut data)?;
        state.write_at(to, &data)
    }

    fn capacity(&self) -> u64 {
        self.state.lock().capacity
    }

    fn allocated(&self) -> u64 {
        self.state.lock().next
    }

    fn growth_events(&self) -> u64 {
        self.growth_events.load(Ordering::SeqCst)
    }

    fn is_new(&self) -> bool {
        self.is_new
    }

    fn flush(&self) -> Result<()> {
        if let Some(file) = self.state.lock().file.as_ref() {
            file.sync_data()?;
        }
        Ok(())
    }

    /// Sync and drop the handle; later reads and writes fail.
    fn close(&self) -> Result<()> {
        if let Some(file) = self.state.lock().file.take() {
            file.sync_data()?;
        }
        Ok(())
    }
}
