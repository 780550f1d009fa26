use std::sync::Arc;
use parking_lot::Mutex;
use crate::blob::Blob;
use crate::column::{row_id, ColumnDef, IndexKind};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::ColumnMeta;
use crate::data::{Value, ValueEncoder};

/// Unindexed column; also used for fact (measure) columns.
pub struct PlainColumn {
    def: ColumnDef,
    blob: Arc<dyn Blob>,
    encoder: Mutex<ValueEncoder>,
}

impl PlainColumn {
    pub fn open(def: ColumnDef, blob: Arc<dyn Blob>, config: &Config) -> Result<Self> {
        let encoder = ValueEncoder::open(Arc::clone(&blob), 0, &def.data_type, config)?;
        Ok(PlainColumn {
            def,
            blob,
            encoder: Mutex::new(encoder),
        })
    }

    pub fn def(&self) -> &ColumnDef {
        &self.def
    }

    pub fn blob(&self) -> &dyn Blob {
        self.blob.as_ref()
    }

    pub fn is_fact(&self) -> bool {
        self.def.index == IndexKind::Fact
    }

    pub fn len(&self) -> u64 {
        self.encoder.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parsed `value`, checked against the encoder's storage limits.
    pub fn check(&self, value: &Value) -> Result<Value> {
        let encoder = self.encoder.lock();
        let value = encoder.parse(value)?;
        encoder.validate(&value)?;
        Ok(value)
    }

    pub fn add(&self, value: Value) -> Result<u64> {
        let mut encoder = self.encoder.lock();
        let value = encoder.parse(&value)?;
        Ok(u64::from(encoder.add(&value)?))
    }

    pub fn get(&self, row: u64) -> Result<Value> {
        let encoder = self.encoder.lock();
        encoder.get(row_id(row, encoder.len())?)
    }

    pub fn display(&self, row: u64) -> Result<String> {
        let encoder = self.encoder.lock();
        let value = encoder.get(row_id(row, encoder.len())?)?;
        Ok(encoder.to_display_string(&value))
    }

    pub(crate) fn unsupported(&self, what: &str) -> Error {
        let kind = if self.is_fact() { "fact" } else { "unindexed" };
        Error::new(
            ErrorKind::UnsupportedQuery,
            format!("{} is not supported on {} column {}", what, kind, self.def.name),
        )
    }

    pub fn meta(&self) -> ColumnMeta {
        ColumnMeta {
            name: self.def.name.clone(),
            index: self.def.index,
            is_fact: self.is_fact(),
            data: self.def.data_type.label().to_string(),
            rows: self.len(),
            distinct: None,
            index_built: false,
            values: Vec::new(),
        }
    }
}
