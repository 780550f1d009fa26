use std::sync::Arc;
use parking_lot::Mutex;
use crate::bits::BitVector;
use crate::blob::Blob;
use crate::column::{render, select, select_labels, ColumnDef, IndexKind, Operator};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::ColumnMeta;
use crate::data::{Value, ValueEncoder};
use crate::index::{BitmapIndex, IndexState, SortedIndex};

/// Deduplicating column: each distinct value is stored once and rows
/// reference it by value-id.
pub struct IndexedColumn {
    def: ColumnDef,
    blob: Arc<dyn Blob>,
    inner: Mutex<IndexedState>,
}

struct IndexedState {
    encoder: ValueEncoder,
    sorted: SortedIndex,
    bitmap: BitmapIndex,
}

impl IndexedColumn {
    pub fn open(def: ColumnDef, blob: Arc<dyn Blob>, config: &Config) -> Result<Self> {
        let encoder = ValueEncoder::open(Arc::clone(&blob), 0, &def.data_type, config)?;
        let slot = ValueEncoder::region_count(&def.data_type);
        let sorted = SortedIndex::open(Arc::clone(&blob), slot, def.cardinality, config.rows_per_block)?;
        let bitmap = BitmapIndex::open(
            Arc::clone(&blob),
            slot + SortedIndex::REGIONS,
            def.cardinality,
            encoder.len(),
            config,
        )?;

        if sorted.len() != encoder.len() {
            return Err(Error::new(
                ErrorKind::InvalidState,
                format!(
                    "column {}: sorted index holds {} entries for {} distinct values",
                    def.name,
                    sorted.len(),
                    encoder.len()
                ),
            ));
        }

        Ok(IndexedColumn {
            def,
            blob,
            inner: Mutex::new(IndexedState { encoder, sorted, bitmap }),
        })
    }

    pub fn def(&self) -> &ColumnDef {
        &self.def
    }

    pub fn blob(&self) -> &dyn Blob {
        self.blob.as_ref()
    }

    pub fn len(&self) -> u64 {
        self.inner.lock().bitmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn distinct(&self) -> u64 {
        self.inner.lock().encoder.len()
    }

    pub fn index_state(&self) -> IndexState {
        self.inner.lock().bitmap.state()
    }

    /// Parsed `value`, or `CapacityExceeded` if it is new and no value-id
    /// is left for it.
    pub fn check(&self, value: &Value) -> Result<Value> {
        let state = self.inner.lock();
        let value = state.encoder.parse(value)?;
        if state.sorted.search(&state.encoder, &value)? < 0 {
            state.encoder.validate(&value)?;
            self.ensure_room(&state)?;
        }
        Ok(value)
    }

    /// Append a row, storing the value first if it is new.
    pub fn add(&self, value: Value) -> Result<u64> {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        let value = state.encoder.parse(&value)?;

        let found = state.sorted.search(&state.encoder, &value)?;
        let id = if found >= 0 {
            state.sorted.value_id(found as u64)?
        } else {
            self.ensure_room(state)?;
            let id = state.encoder.add(&value)?;
            state.sorted.sort(&state.encoder, &value, id, false)?;
            id
        };

        state.bitmap.add(id)
    }

    fn ensure_room(&self, state: &IndexedState) -> Result<()> {
        if state.encoder.len() > u64::from(state.sorted.max_value_id()) {
            return Err(Error::new(
                ErrorKind::CapacityExceeded,
                format!(
                    "column {}: {} distinct values do not fit cardinality {}",
                    self.def.name,
                    state.encoder.len() + 1,
                    self.def.cardinality
                ),
            ));
        }
        Ok(())
    }

    /// Value-id stored at `row`.
    pub fn value_id(&self, row: u64) -> Result<u32> {
        self.inner.lock().bitmap.value_id(row)
    }

    pub fn get(&self, row: u64) -> Result<Value> {
        let state = self.inner.lock();
        let id = state.bitmap.value_id(row)?;
        state.encoder.get(id)
    }

    pub fn display(&self, row: u64) -> Result<String> {
        let state = self.inner.lock();
        let value = state.encoder.get(state.bitmap.value_id(row)?)?;
        Ok(state.encoder.to_display_string(&value))
    }

    /// Permutation position of `value` among the distinct values.
    pub fn search(&self, value: &Value) -> Result<i64> {
        let state = self.inner.lock();
        let value = state.encoder.parse(value)?;
        state.sorted.search(&state.encoder, &value)
    }

    /// Uses the bitmap from the last successful rebuild; rows added since
    /// then may be missed.
    pub fn filter(&self, op: Operator, values: &[Value]) -> Result<BitVector> {
        let state = self.inner.lock();
        select(&state.sorted, &state.encoder, &state.bitmap, state.bitmap.len(), op, values)
    }

    pub fn rebuild(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        let distinct = state.encoder.len();
        tracing::debug_span!("rebuild", column = %self.def.name).in_scope(|| state.bitmap.rebuild(distinct))
    }

    pub fn try_rebuild(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        let distinct = state.encoder.len();
        tracing::debug_span!("rebuild", column = %self.def.name).in_scope(|| state.bitmap.try_rebuild(distinct))
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

    /// Distinct values are listed in value-id order while there are fewer
    /// than `preview_limit` of them.
    pub fn meta(&self, preview_limit: usize) -> Result<ColumnMeta> {
        let state = self.inner.lock();
        let distinct = state.encoder.len();

        let mut values = Vec::new();
        if distinct < preview_limit as u64 {
            for id in 0..distinct as u32 {
                values.push(state.encoder.to_display_string(&state.encoder.get(id)?));
            }
        }

        Ok(ColumnMeta {
            name: self.def.name.clone(),
            index: IndexKind::Indexed,
            is_fact: false,
            data: self.def.data_type.label().to_string(),
            rows: state.bitmap.len(),
            distinct: Some(distinct),
            index_built: state.bitmap.state() == IndexState::Built,
            values,
        })
    }
}
