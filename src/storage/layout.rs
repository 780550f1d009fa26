use std::path::PathBuf;
use std::fs;
use crate::core::error::{Error, ErrorKind, Result};

/// Directory structure for a dataset
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,      // Root directory
    pub columns_dir: PathBuf,   // One .col file per column
}

impl StorageLayout {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        let columns_dir = base_dir.join("columns");

        fs::create_dir_all(&columns_dir)?;

        Ok(StorageLayout {
            base_dir,
            columns_dir,
        })
    }

    pub fn column_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !name.starts_with('.');
        if !valid {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("column name {:?} cannot be used as a file name", name),
            ));
        }
        Ok(self.columns_dir.join(format!("{}.col", name)))
    }

    pub fn lock_path(&self) -> PathBuf {
        self.base_dir.join(".lock")
    }

    /// Bytes held by all column files.
    pub fn disk_usage(&self) -> Result<u64> {
        let mut total = 0;
        for entry in fs::read_dir(&self.columns_dir)? {
            let entry = entry?;
            if entry.path().extension().is_some_and(|ext| ext == "col") {
                total += entry.metadata()?.len();
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_columns_dir() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().join("trades")).unwrap();
        assert!(layout.columns_dir.is_dir());
        assert_eq!(
            layout.column_path("symbol").unwrap(),
            dir.path().join("trades").join("columns").join("symbol.col")
        );
        assert_eq!(layout.lock_path(), dir.path().join("trades").join(".lock"));
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path().to_path_buf()).unwrap();
        for bad in ["", "../x", "a/b", ".hidden"] {
            assert_eq!(layout.column_path(bad).unwrap_err().kind(), ErrorKind::InvalidArgument);
        }
    }
}
