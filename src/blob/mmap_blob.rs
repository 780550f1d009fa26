use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use memmap2::MmapMut;
use parking_lot::RwLock;
use crate::blob::{check_bounds, data_start, grown_capacity, Blob};
use crate::core::error::{Error, ErrorKind, Result};

struct MmapState {
    file: File,
    mmap: Option<MmapMut>,
    capacity: u64,
    next: u64,
}

impl MmapState {
    fn map(&self) -> Result<&MmapMut> {
        self.mmap.as_ref()
            .ok_or_else(|| Error::new(ErrorKind::InvalidState, "blob is closed".to_string()))
    }

    fn map_mut(&mut self) -> Result<&mut MmapMut> {
        self.mmap.as_mut()
            .ok_or_else(|| Error::new(ErrorKind::InvalidState, "blob is closed".to_string()))
    }

    /// Flush, unmap, extend the file and map it again.
    fn extend(&mut self, new_capacity: u64) -> Result<()> {
        if let Some(mmap) = self.mmap.take() {
            mmap.flush()?;
            drop(mmap);
        }

        self.file.set_len(new_capacity)?;
        // SAFETY: the file is opened read-write by this blob and the old
        // mapping was dropped above.
        self.mmap = Some(unsafe { MmapMut::map_mut(&self.file)? });
        self.capacity = new_capacity;
        Ok(())
    }
}

/// Memory-mapped blob: reads and writes go straight to the mapping.
pub struct MmapBlob {
    path: PathBuf,
    state: RwLock<MmapState>,
    increment: u64,
    is_new: bool,
    growth_events: AtomicU64,
}

impl MmapBlob {
    pub fn open<P: AsRef<Path>>(path: P, region_count: usize, increment: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let mut len = file.metadata()?.len();
        let is_new = len == 0;
        if is_new {
            file.set_len(increment)?;
            len = increment;
        }

        // SAFETY: the dataset directory lock keeps other handles from
        // resizing the file while it is mapped.
        let mut mmap = unsafe { MmapMut::map_mut(&file)? };

        let next = if is_new {
            let next = data_start(region_count);
            mmap[0..8].copy_from_slice(&next.to_le_bytes());
            next
        } else {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&mmap[0..8]);
            u64::from_le_bytes(buf)
        };

        tracing::debug!(path = %path.display(), capacity = len, next, is_new, "opened mmap blob");

        Ok(MmapBlob {
            path,
            state: RwLock::new(MmapState { file, mmap: Some(mmap), capacity: len, next }),
            increment,
            is_new,
            growth_events: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Blob for MmapBlob {
    fn alloc(&self, bytes: u64) -> Result<u64> {
        let mut state = self.state.write();
        state.map()?;

        let total = state.next + bytes;
        if total > state.capacity {
            let new_capacity = grown_capacity(state.capacity, total, self.increment);
            tracing::debug!(
                path = %self.path.display(),
                from = state.capacity,
                to = new_capacity,
                "growing mmap blob"
            );
            state.extend(new_capacity)?;
            self.growth_events.fetch_add(1, Ordering::SeqCst);
        }

        let pos = state.next;
        state.next = total;
        state.map_mut()?[0..8].copy_from_slice(&total.to_le_bytes());

        Ok(pos)
    }

    fn read_at(&self, pos: u64, buf: &mut [u8]) -> Result<()> {
        let state = self.state.read();
        check_bounds(pos, buf.len() as u64, state.capacity)?;
        let start = pos as usize;
        buf.copy_from_slice(&state.map()?[start..start + buf.len()]);
        Ok(())
    }

    fn write_at(&self, pos: u64, data: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        check_bounds(pos, data.len() as u64, state.capacity)?;
        let start = pos as usize;
        state.map_mut()?[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn copy(&self, from: u64, to: u64, len: u64) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let mut state = self.state.write();
        check_bounds(from, len, state.capacity)?;
        check_bounds(to, len, state.capacity)?;
        let from = from as usize;
        state.map_mut()?.copy_within(from..from + len as usize, to as usize);
        Ok(())
    }

    fn capacity(&self) -> u64 {
        self.state.read().capacity
    }

    fn allocated(&self) -> u64 {
        self.state.read().next
    }

    fn growth_events(&self) -> u64 {
        self.growth_events.load(Ordering::SeqCst)
    }

    fn is_new(&self) -> bool {
        self.is_new
    }

    fn flush(&self) -> Result<()> {
        let state = self.state.read();
        if let Some(mmap) = state.mmap.as_ref() {
            mmap.flush()?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        if let Some(mmap) = state.mmap.take() {
            mmap.flush()?;
        }
        Ok(())
    }
}

impl Drop for MmapBlob {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
