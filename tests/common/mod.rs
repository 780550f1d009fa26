#![allow(dead_code)]

use std::path::Path;
use quanta::{BlobKind, Config};

/// Config with tiny blocks so tests cross block and growth boundaries fast.
pub fn small_config(dir: &Path) -> Config {
    Config {
        storage_path: dir.to_path_buf(),
        growth_increment: 64 * 1024,
        rows_per_block: 8,
        variable_block_size: 4096,
        ..Config::default()
    }
}

pub fn file_config(dir: &Path) -> Config {
    Config {
        blob_kind: BlobKind::File,
        ..small_config(dir)
    }
}

pub fn both_kinds(dir: &Path) -> Vec<(&'static str, Config)> {
    vec![("mmap", small_config(dir)), ("file", file_config(dir))]
}
