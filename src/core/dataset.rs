use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use rayon::prelude::*;
use crate::bits::BitVector;
use crate::column::{Column, ColumnDef, Operator};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::{ColumnMeta, DatasetStats};
use crate::data::Value;
use crate::storage::{FileLock, StorageLayout};

/// Column name to value for one row.
pub type Record = HashMap<String, Value>;

/// Ordered set of columns stored under one directory.
///
/// Rows are appended whole through [`add_record`](Dataset::add_record);
/// predicates run against a single column and return a row set that
/// callers combine with [`BitVector`] algebra.
pub struct Dataset {
    name: String,
    config: Config,
    storage: StorageLayout,
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
    rows: AtomicU64,
    writer: Mutex<()>,      // keeps columns row-aligned across add_record calls
    _lock: FileLock,
}

impl Dataset {
    /// Create or reopen the dataset at `config.storage_path`.
    ///
    /// Columns are opened in definition order. Reopening with different
    /// definitions than the files were written with is not detected.
    pub fn open(name: impl Into<String>, config: Config, defs: Vec<ColumnDef>) -> Result<Self> {
        let name = name.into();
        if defs.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument, format!("dataset {} has no columns", name)));
        }

        let storage = StorageLayout::new(config.storage_path.clone())?;
        let lock = FileLock::acquire(&storage)?;

        let mut by_name = HashMap::with_capacity(defs.len());
        let mut columns = Vec::with_capacity(defs.len());
        for (i, def) in defs.into_iter().enumerate() {
            if by_name.insert(def.name.clone(), i).is_some() {
                return Err(Error::new(
                    ErrorKind::InvalidArgument,
                    format!("dataset {}: duplicate column {}", name, def.name),
                ));
            }
            let path = storage.column_path(&def.name)?;
            columns.push(Column::open(def, &path, &config)?);
        }

        let rows = columns[0].len();
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!(
                    "dataset {}: column {} has {} rows, column {} has {}",
                    name,
                    bad.name(),
                    bad.len(),
                    columns[0].name(),
                    rows
                ),
            ));
        }

        tracing::debug!(dataset = %name, columns = columns.len(), rows, "opened dataset");

        Ok(Dataset {
            name,
            config,
            storage,
            columns,
            by_name,
            rows: AtomicU64::new(rows),
            writer: Mutex::new(()),
            _lock: lock,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn len(&self) -> u64 {
        self.rows.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.by_name
            .get(name)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("dataset {}: no column {}", self.name, name)))
    }

    /// Append one row. Every column must be present in `record`; other
    /// keys are ignored.
    ///
    /// Values are checked against every column before any is written, so a
    /// rejected record leaves the dataset unchanged.
    pub fn add_record(&self, record: &Record) -> Result<u64> {
        let _writer = self.writer.lock();

        let mut parsed = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let value = record.get(column.name()).ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidInput,
                    format!("dataset {}: record has no value for column {}", self.name, column.name()),
                )
            })?;
            parsed.push(column.check(value.clone())?);
        }

        let row = self.len();
        for (column, value) in self.columns.iter().zip(parsed) {
            column.add(value)?;
        }
        self.rows.store(row + 1, Ordering::Release);
        Ok(row)
    }

    /// Rows of `column` satisfying `op`.
    pub fn filter(&self, column: &str, op: Operator, values: &[Value]) -> Result<BitVector> {
        self.column(column)?.filter(op, values)
    }

    pub fn labels(&self, column: &str, op: Operator, values: &[Value]) -> Result<Vec<String>> {
        self.column(column)?.labels(op, values)
    }

    /// Rebuild every indexed column in parallel.
    pub fn rebuild(&self) -> Result<()> {
        self.columns.par_iter().try_for_each(|column| column.rebuild())?;
        tracing::debug!(dataset = %self.name, rows = self.len(), "rebuilt indexes");
        Ok(())
    }

    /// Values of `row` in column definition order.
    pub fn row(&self, row: u64) -> Result<Vec<Value>> {
        let len = self.len();
        if row >= len {
            return Err(Error::bounds(row, len));
        }
        self.columns.iter().map(|c| c.get(row)).collect()
    }

    /// Values of `row` keyed by column name.
    pub fn record(&self, row: u64) -> Result<Record> {
        let values = self.row(row)?;
        Ok(self
            .columns
            .iter()
            .map(|c| c.name().to_string())
            .zip(values)
            .collect())
    }

    pub fn metadata(&self) -> Result<Vec<ColumnMeta>> {
        self.columns
            .iter()
            .map(|c| c.meta(self.config.meta_preview_limit))
            .collect()
    }

    pub fn stats(&self) -> Result<DatasetStats> {
        Ok(DatasetStats {
            name: self.name.clone(),
            rows: self.len(),
            columns: self.columns.len(),
            storage_bytes: self.storage.disk_usage()?,
            growth_events: self.columns.iter().map(|c| c.blob().growth_events()).sum(),
        })
    }

    pub fn flush(&self) -> Result<()> {
        for column in &self.columns {
            column.flush()?;
        }
        Ok(())
    }

    /// Flush and close every column, then release the directory lock.
    pub fn close(self) -> Result<()> {
        for column in &self.columns {
            column.close()?;
        }
        tracing::debug!(dataset = %self.name, rows = self.len(), "closed dataset");
        Ok(())
    }
}
