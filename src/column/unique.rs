use std::sync::Arc;
use parking_lot::Mutex;
use crate::bits::BitVector;
use crate::blob::Blob;
use crate::column::{render, row_id, select, select_labels, ColumnDef, IndexKind, Operator};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::ColumnMeta;
use crate::data::{Value, ValueEncoder};
use crate::index::{SortedIndex, UniqueRowMarker};

/// Column where every row holds a distinct value.
pub struct UniqueColumn {
    def: ColumnDef,
    blob: Arc<dyn Blob>,
    inner: Mutex<UniqueState>,
}

struct UniqueState {
    encoder: ValueEncoder,
    sorted: SortedIndex,
}

impl UniqueColumn {
    pub fn open(def: ColumnDef, blob: Arc<dyn Blob>, config: &Config) -> Result<Self> {
        let encoder = ValueEncoder::open(Arc::clone(&blob), 0, &def.data_type, config)?;
        let slot = ValueEncoder::region_count(&def.data_type);
        let sorted = SortedIndex::open(Arc::clone(&blob), slot, def.cardinality, config.rows_per_block)?;

        if sorted.len() != encoder.len() {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!(
                    "column {}: sorted index holds {} entries for {} values",
                    def.name,
                    sorted.len(),
                    encoder.len()
                ),
            ));
        }

        Ok(UniqueColumn {
            def,
            blob,
            inner: Mutex::new(UniqueState { encoder, sorted }),
        })
    }

    pub fn def(&self) -> &ColumnDef {
        &self.def
    }

    pub fn blob(&self) -> &dyn Blob {
        self.blob.as_ref()
    }

    pub fn len(&self) -> u64 {
        self.inner.lock().encoder.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parsed `value`, or `UniquenessViolation` if it is already stored.
    pub fn check(&self, value: &Value) -> Result<Value> {
        let state = self.inner.lock();
        let value = state.encoder.parse(value)?;
        state.encoder.validate(&value)?;
        self.ensure_absent(&state, &value)?;
        Ok(value)
    }

    /// Append a value; a duplicate is rejected before anything is written.
    pub fn add(&self, value: Value) -> Result<u64> {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        let value = state.encoder.parse(&value)?;
        self.ensure_absent(state, &value)?;

        let id = state.encoder.add(&value)?;
        state.sorted.sort(&state.encoder, &value, id, true)?;
        Ok(u64::from(id))
    }

    fn ensure_absent(&self, state: &UniqueState, value: &Value) -> Result<()> {
        if state.sorted.search(&state.encoder, value)? >= 0 {
            return Err(Error::new(
                ErrorKind::UniquenessViolation,
                format!("column {}: key {} already present", self.def.name, value),
            ));
        }
        if state.encoder.len() > u64::from(state.sorted.max_value_id()) {
            return Err(Error::new(
                ErrorKind::CapacityExceeded,
                format!("column {}: more than {} rows", self.def.name, self.def.cardinality),
            ));
        }
        Ok(())
    }

    pub fn get(&self, row: u64) -> Result<Value> {
        let state = self.inner.lock();
        state.encoder.get(row_id(row, state.encoder.len())?)
    }

    pub fn display(&self, row: u64) -> Result<String> {
        let state = self.inner.lock();
        let value = state.encoder.get(row_id(row, state.encoder.len())?)?;
        Ok(state.encoder.to_display_string(&value))
    }

    /// Permutation position of `value`, or `-(insertion_point + 1)`.
    pub fn search(&self, value: &Value) -> Result<i64> {
        let state = self.inner.lock();
        let value = state.encoder.parse(value)?;
        state.sorted.search(&state.encoder, &value)
    }

    pub fn filter(&self, op: Operator, values: &[Value]) -> Result<BitVector> {
        let state = self.inner.lock();
        select(&state.sorted, &state.encoder, &UniqueRowMarker, state.encoder.len(), op, values)
    }

    pub fn labels(&self, op: Operator, values: &[Value]) -> Result<Vec<String>> {
        let state = self.inner.lock();
        select_labels(&state.sorted, &state.encoder, op, values)
    }

    pub fn all_labels(&self) -> Result<Vec<String>> {
        let state = self.inner.lock();
        let ids = state.sorted.ids_in(0..state.sorted.len())?;
        render(&state.encoder, ids)
    }

    pub fn meta(&self) -> Result<ColumnMeta> {
        let rows = self.len();
        Ok(ColumnMeta {
            name: self.def.name.clone(),
            index: IndexKind::Unique,
            is_fact: false,
            data: self.def.data_type.label().to_string(),
            rows,
            distinct: Some(rows),
            index_built: true,
            values: Vec::new(),
        })
    }
}
