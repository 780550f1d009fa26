use std::path::PathBuf;
use serde::{Serialize, Deserialize};

/// Which allocator realization backs a column file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlobKind {
    Mmap,   // memory-mapped view, direct reads/writes
    File,   // positioned file I/O
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_path: PathBuf,
    pub blob_kind: BlobKind,

    // Allocator
    pub growth_increment: u64,          // bytes added to the file per growth event

    // Regions
    pub rows_per_block: u64,            // FixedRegion rows per block
    pub variable_block_size: u64,       // VariableRegion block body in bytes

    // Bitmap index
    pub bitmap_max_bytes: u64,          // ceiling for a whole column bitmap
    pub bitmap_block_multiple: u64,     // block length is rounded up to this

    // Metadata
    pub meta_preview_limit: usize,      // distinct values listed in ColumnMeta
}

impl Config {
    pub fn with_path(storage_path: impl Into<PathBuf>) -> Self {
        Config {
            storage_path: storage_path.into(),
            ..Config::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: PathBuf::from("./data"),
            blob_kind: BlobKind::Mmap,

            growth_increment: 8 * 1024 * 1024,      // 8MB

            rows_per_block: 500,
            variable_block_size: 4 * 1024 * 1024,   // 4MB

            bitmap_max_bytes: 40 * 1024 * 1024,     // 40MB
            bitmap_block_multiple: 50,

            meta_preview_limit: 10_000,
        }
    }
}
