//! Typed columns and their predicate surface.
//!
//! Three shapes exist:
//!
//! * [`UniqueColumn`]: one value per row, every value distinct. The sorted
//!   index covers every row and the value-id is the row number.
//! * [`IndexedColumn`]: values are deduplicated. Rows store value-ids and a
//!   coarse bitmap index narrows down which rows to scan.
//! * [`PlainColumn`]: storage only, no predicates (no-index and fact columns).
//!
//! Each column keeps its state behind its own `parking_lot::Mutex`, so one
//! column is fully serialized while different columns proceed in parallel.

pub mod indexed;
pub mod operator;
pub mod plain;
pub mod unique;

use std::path::Path;
use std::sync::LazyLock;
use regex::Regex;
use serde::{Serialize, Deserialize};
use crate::bits::BitVector;
use crate::blob::{open_blob, Blob};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::ColumnMeta;
use crate::data::{DataType, Value, ValueEncoder};
use crate::index::{RowMarker, SortedIndex};

pub use indexed::IndexedColumn;
pub use operator::Operator;
pub use plain::PlainColumn;
pub use unique::UniqueColumn;

static NON_PRINTABLE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[\p{Cc}\p{Cf}]").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Unique,
    Indexed,
    None,
    Fact,
}

/// Distinct-value ceilings for deduplicating columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexCardinality {
    Tiny,
    Small,
    Medium,
    Large,
}

impl IndexCardinality {
    pub fn ceiling(&self) -> u64 {
        match self {
            IndexCardinality::Tiny => 255,
            IndexCardinality::Small => 65_534,
            IndexCardinality::Medium => 16_777_214,
            IndexCardinality::Large => 16_777_215,
        }
    }
}

impl From<IndexCardinality> for u64 {
    fn from(c: IndexCardinality) -> u64 {
        c.ceiling()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub index: IndexKind,
    /// Largest number of distinct values the column indexes.
    pub cardinality: u64,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType, index: IndexKind, cardinality: u64) -> Self {
        ColumnDef {
            name: name.into(),
            data_type,
            index,
            cardinality,
        }
    }

    pub fn unique(name: impl Into<String>, data_type: DataType) -> Self {
        ColumnDef::new(name, data_type, IndexKind::Unique, IndexCardinality::Large.ceiling())
    }

    pub fn indexed(name: impl Into<String>, data_type: DataType, cardinality: impl Into<u64>) -> Self {
        ColumnDef::new(name, data_type, IndexKind::Indexed, cardinality.into())
    }

    pub fn plain(name: impl Into<String>, data_type: DataType) -> Self {
        ColumnDef::new(name, data_type, IndexKind::None, 0)
    }

    pub fn fact(name: impl Into<String>, data_type: DataType) -> Self {
        ColumnDef::new(name, data_type, IndexKind::Fact, 0)
    }

    /// Header slots the column file needs.
    pub fn region_count(&self) -> usize {
        let encoder = ValueEncoder::region_count(&self.data_type);
        match self.index {
            IndexKind::Unique => encoder + SortedIndex::REGIONS,
            IndexKind::Indexed => encoder + SortedIndex::REGIONS + crate::index::BitmapIndex::REGIONS,
            IndexKind::None | IndexKind::Fact => encoder,
        }
    }
}

pub enum Column {
    Unique(UniqueColumn),
    Indexed(IndexedColumn),
    Plain(PlainColumn),
}

impl Column {
    /// Open or create the column stored at `path`.
    pub fn open(def: ColumnDef, path: &Path, config: &Config) -> Result<Self> {
        let blob = open_blob(config.blob_kind, path, def.region_count(), config)?;
        let column = match def.index {
            IndexKind::Unique => Column::Unique(UniqueColumn::open(def, blob, config)?),
            IndexKind::Indexed => Column::Indexed(IndexedColumn::open(def, blob, config)?),
            IndexKind::None | IndexKind::Fact => Column::Plain(PlainColumn::open(def, blob, config)?),
        };
        Ok(column)
    }

    pub fn def(&self) -> &ColumnDef {
        match self {
            Column::Unique(c) => c.def(),
            Column::Indexed(c) => c.def(),
            Column::Plain(c) => c.def(),
        }
    }

    pub fn name(&self) -> &str {
        &self.def().name
    }

    pub fn blob(&self) -> &dyn Blob {
        match self {
            Column::Unique(c) => c.blob(),
            Column::Indexed(c) => c.blob(),
            Column::Plain(c) => c.blob(),
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            Column::Unique(c) => c.len(),
            Column::Indexed(c) => c.len(),
            Column::Plain(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sanitise, coerce to the column type and append. Returns the row.
    pub fn add(&self, value: impl Into<Value>) -> Result<u64> {
        let value = sanitize(value.into());
        match self {
            Column::Unique(c) => c.add(value),
            Column::Indexed(c) => c.add(value),
            Column::Plain(c) => c.add(value),
        }
    }

    /// Coerce `value` the way [`add`](Self::add) would and report whether
    /// the add could succeed, without writing anything.
    pub fn check(&self, value: impl Into<Value>) -> Result<Value> {
        let value = sanitize(value.into());
        match self {
            Column::Unique(c) => c.check(&value),
            Column::Indexed(c) => c.check(&value),
            Column::Plain(c) => c.check(&value),
        }
    }

    pub fn get(&self, row: u64) -> Result<Value> {
        match self {
            Column::Unique(c) => c.get(row),
            Column::Indexed(c) => c.get(row),
            Column::Plain(c) => c.get(row),
        }
    }

    /// Value at `row` rendered by the column's encoder.
    pub fn display(&self, row: u64) -> Result<String> {
        match self {
            Column::Unique(c) => c.display(row),
            Column::Indexed(c) => c.display(row),
            Column::Plain(c) => c.display(row),
        }
    }

    /// Sorted-index position of `value`, or `-(insertion_point + 1)`.
    pub fn search(&self, value: impl Into<Value>) -> Result<i64> {
        let value = sanitize(value.into());
        match self {
            Column::Unique(c) => c.search(&value),
            Column::Indexed(c) => c.search(&value),
            Column::Plain(c) => Err(c.unsupported("search")),
        }
    }

    /// Rows satisfying `op` over `values`.
    pub fn filter(&self, op: Operator, values: &[Value]) -> Result<BitVector> {
        check_arity(op, values)?;
        match self {
            Column::Unique(c) => c.filter(op, values),
            Column::Indexed(c) => c.filter(op, values),
            Column::Plain(c) => Err(c.unsupported("filter")),
        }
    }

    pub fn eq(&self, values: &[Value]) -> Result<BitVector> {
        self.filter(Operator::Eq, values)
    }

    pub fn not(&self, values: &[Value]) -> Result<BitVector> {
        self.filter(Operator::Not, values)
    }

    pub fn gt(&self, value: Value) -> Result<BitVector> {
        self.filter(Operator::Gt, &[value])
    }

    pub fn lt(&self, value: Value) -> Result<BitVector> {
        self.filter(Operator::Lt, &[value])
    }

    pub fn between(&self, low: Value, high: Value) -> Result<BitVector> {
        self.filter(Operator::Between, &[low, high])
    }

    /// Distinct display strings matched by `op`, in value order.
    pub fn labels(&self, op: Operator, values: &[Value]) -> Result<Vec<String>> {
        check_arity(op, values)?;
        match self {
            Column::Unique(c) => c.labels(op, values),
            Column::Indexed(c) => c.labels(op, values),
            Column::Plain(c) => Err(c.unsupported("labels")),
        }
    }

    pub fn all_labels(&self) -> Result<Vec<String>> {
        match self {
            Column::Unique(c) => c.all_labels(),
            Column::Indexed(c) => c.all_labels(),
            Column::Plain(c) => Err(c.unsupported("labels")),
        }
    }

    /// Regenerate the bitmap of a deduplicating column; a no-op elsewhere.
    pub fn rebuild(&self) -> Result<()> {
        match self {
            Column::Indexed(c) => c.rebuild(),
            _ => Ok(()),
        }
    }

    /// Like [`rebuild`](Self::rebuild) but reports a capacity skip.
    pub fn try_rebuild(&self) -> Result<()> {
        match self {
            Column::Indexed(c) => c.try_rebuild(),
            _ => Ok(()),
        }
    }

    pub fn meta(&self, preview_limit: usize) -> Result<ColumnMeta> {
        match self {
            Column::Unique(c) => c.meta(),
            Column::Indexed(c) => c.meta(preview_limit),
            Column::Plain(c) => Ok(c.meta()),
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.blob().flush()
    }

    /// Flush and release the backing file. Later calls fail.
    pub fn close(&self) -> Result<()> {
        self.blob().close()
    }
}

/// Trim and strip control and format characters from string input.
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::Str(s) => {
            let trimmed = s.trim();
            match NON_PRINTABLE.as_ref() {
                Some(re) => Value::Str(re.replace_all(trimmed, "").into_owned()),
                None => Value::Str(trimmed.chars().filter(|c| !c.is_control()).collect()),
            }
        }
        other => other,
    }
}

fn check_arity(op: Operator, values: &[Value]) -> Result<()> {
    if values.len() < op.arity() {
        return Err(Error::new(
            ErrorKind::InvalidArgument,
            format!("operator {} needs {} value(s), got {}", op, op.arity(), values.len()),
        ));
    }
    Ok(())
}

fn parse_all(encoder: &ValueEncoder, values: &[Value]) -> Result<Vec<Value>> {
    values.iter().map(|v| encoder.parse(&sanitize(v.clone()))).collect()
}

/// Run a predicate through a sorted index.
pub(crate) fn select(
    sorted: &SortedIndex,
    encoder: &ValueEncoder,
    marker: &dyn RowMarker,
    rows: u64,
    op: Operator,
    values: &[Value],
) -> Result<BitVector> {
    let values = parse_all(encoder, values)?;
    let rows = rows as usize;
    match op {
        Operator::Eq => sorted.eq(encoder, &values, marker, rows),
        Operator::Not => sorted.not(encoder, &values, marker, rows),
        Operator::Gt => sorted.gt(encoder, &values[0], marker, rows),
        Operator::Lt => sorted.lt(encoder, &values[0], marker, rows),
        Operator::Between => sorted.between(encoder, &values[0], &values[1], marker, rows),
    }
}

/// Display strings of the distinct values a predicate selects.
pub(crate) fn select_labels(
    sorted: &SortedIndex,
    encoder: &ValueEncoder,
    op: Operator,
    values: &[Value],
) -> Result<Vec<String>> {
    let values = parse_all(encoder, values)?;
    let ids = match op {
        Operator::Eq => {
            let mut positions = sorted.eq_positions(encoder, &values)?;
            positions.sort_unstable();
            positions.into_iter().map(|p| sorted.value_id(p)).collect::<Result<Vec<_>>>()?
        }
        Operator::Not => {
            let found = sorted.eq_positions(encoder, &values)?;
            let mut ids = Vec::new();
            for (pos, id) in sorted.ids_in(0..sorted.len())?.into_iter().enumerate() {
                if !found.contains(&(pos as u64)) {
                    ids.push(id);
                }
            }
            ids
        }
        Operator::Gt => sorted.ids_in(sorted.gt_range(encoder, &values[0])?)?,
        Operator::Lt => sorted.ids_in(sorted.lt_range(encoder, &values[0])?)?,
        Operator::Between => sorted.ids_in(sorted.between_range(encoder, &values[0], &values[1])?)?,
    };
    render(encoder, ids)
}

pub(crate) fn render(encoder: &ValueEncoder, ids: Vec<u32>) -> Result<Vec<String>> {
    let mut labels: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let label = encoder.to_display_string(&encoder.get(id)?);
        if labels.last() != Some(&label) {
            labels.push(label);
        }
    }
    Ok(labels)
}

pub(crate) fn row_id(row: u64, len: u64) -> Result<u32> {
    if row >= len {
        return Err(Error::bounds(row, len));
    }
    u32::try_from(row).map_err(|_| Error::bounds(row, len))
}
