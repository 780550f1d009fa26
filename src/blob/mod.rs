//! Growable byte-addressable storage with bump-pointer allocation.
//!
//! A blob is one file. Byte 0 holds the bump pointer, followed by one
//! 16-byte header slot per region registered at open time. Everything after
//! the header slots is handed out by [`Blob::alloc`] and never reclaimed.

pub mod file_blob;
pub mod mmap_blob;

use std::path::Path;
use std::sync::Arc;
use crate::core::config::{BlobKind, Config};
use crate::core::error::{Error, ErrorKind, Result};

pub use file_blob::FileBlob;
pub use mmap_blob::MmapBlob;

/// Width of the bump-pointer header and of every region header slot.
pub const HEADER_SLOT: u64 = 16;

/// Header slot offset for the region registered at `slot`.
pub fn header_pos(slot: usize) -> u64 {
    HEADER_SLOT * (slot as u64 + 1)
}

/// First allocatable offset in a fresh file with `region_count` slots.
pub fn data_start(region_count: usize) -> u64 {
    HEADER_SLOT * (region_count as u64 + 1)
}

/// Smallest multiple of `increment` added to `capacity` that covers `required`.
pub(crate) fn grown_capacity(capacity: u64, required: u64, increment: u64) -> u64 {
    if required <= capacity {
        return capacity;
    }
    let missing = required - capacity;
    let steps = missing.div_ceil(increment);
    capacity + steps * increment
}

pub(crate) fn check_bounds(pos: u64, len: u64, capacity: u64) -> Result<()> {
    match pos.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(Error::new(
            ErrorKind::StorageBounds,
            format!("requested range {}..{} exceeds capacity {}", pos, pos.saturating_add(len), capacity),
        )),
    }
}

/// Allocator contract shared by the memory-mapped and positioned-I/O realizations.
///
/// All scalars are little-endian. Allocation and growth are serialized by
/// the blob's own lock; callers coordinate everything else.
pub trait Blob: Send + Sync {
    /// Reserve `bytes` at the bump pointer, growing the file if needed.
    /// Returns the start offset of the reservation.
    fn alloc(&self, bytes: u64) -> Result<u64>;

    fn read_at(&self, pos: u64, buf: &mut [u8]) -> Result<()>;

    fn write_at(&self, pos: u64, data: &[u8]) -> Result<()>;

    /// Move `len` bytes from `from` to `to`. Ranges may overlap.
    fn copy(&self, from: u64, to: u64, len: u64) -> Result<()>;

    /// Bytes currently backed by the file.
    fn capacity(&self) -> u64;

    /// Current bump pointer.
    fn allocated(&self) -> u64;

    fn growth_events(&self) -> u64;

    /// True when the file did not exist (or was empty) at open.
    fn is_new(&self) -> bool;

    fn flush(&self) -> Result<()>;

    /// Flush and release the underlying mapping or handle.
    fn close(&self) -> Result<()>;

    fn get_bytes(&self, pos: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_at(pos, &mut buf)?;
        Ok(buf)
    }

    fn get_u8(&self, pos: u64) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_at(pos, &mut buf)?;
        Ok(buf[0])
    }

    fn put_u8(&self, pos: u64, v: u8) -> Result<()> {
        self.write_at(pos, &[v])
    }

    fn get_u32(&self, pos: u64) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_at(pos, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn put_u32(&self, pos: u64, v: u32) -> Result<()> {
        self.write_at(pos, &v.to_le_bytes())
    }

    fn get_u64(&self, pos: u64) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_at(pos, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn put_u64(&self, pos: u64, v: u64) -> Result<()> {
        self.write_at(pos, &v.to_le_bytes())
    }
}

/// Open (or create) the blob at `path` with `region_count` header slots.
pub fn open_blob<P: AsRef<Path>>(
    kind: BlobKind,
    path: P,
    region_count: usize,
    config: &Config,
) -> Result<Arc<dyn Blob>> {
    let blob: Arc<dyn Blob> = match kind {
        BlobKind::Mmap => Arc::new(MmapBlob::open(path, region_count, config.growth_increment)?),
        BlobKind::File => Arc::new(FileBlob::open(path, region_count, config.growth_increment)?),
    };
    Ok(blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_slots_follow_bump_pointer() {
        assert_eq!(header_pos(0), 16);
        assert_eq!(header_pos(2), 48);
        assert_eq!(data_start(3), 64);
        assert_eq!(data_start(0), 16);
    }

    #[test]
    fn growth_rounds_to_whole_increments() {
        assert_eq!(grown_capacity(100, 50, 100), 100);
        assert_eq!(grown_capacity(100, 101, 100), 200);
        assert_eq!(grown_capacity(100, 350, 100), 400);
    }

    #[test]
    fn bounds_reject_overflow() {
        assert!(check_bounds(0, 10, 10).is_ok());
        assert_eq!(check_bounds(5, 6, 10).unwrap_err().kind, ErrorKind::StorageBounds);
        assert!(check_bounds(u64::MAX, 2, 10).is_err());
    }
}
