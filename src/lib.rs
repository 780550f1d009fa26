pub mod core;
pub mod storage;
pub mod blob;
pub mod region;
pub mod data;
pub mod index;
pub mod bits;
pub mod column;

pub use crate::bits::BitVector;
pub use crate::column::{Column, ColumnDef, IndexCardinality, IndexKind, Operator};
pub use crate::core::config::{BlobKind, Config};
pub use crate::core::dataset::{Dataset, Record};
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::stats::{ColumnMeta, DatasetStats};
pub use crate::data::{DataType, Value};

/*
┌──────────────────────────────── QUANTA STRUCT ARCHITECTURE ────────────────────────────────┐
│                                                                                            │
│  struct Dataset                                                                            │
│    storage: StorageLayout         // <storage_path>/columns/<name>.col                     │
│    columns: Vec<Column>           // definition order                                      │
│    _lock: FileLock                // flock on <storage_path>/.lock                         │
│                                                                                            │
│  enum Column ──┬── UniqueColumn   { encoder, sorted }                  Mutex per column    │
│                ├── IndexedColumn  { encoder, sorted, bitmap(rows) }                        │
│                └── PlainColumn    { encoder }                                              │
│                                                                                            │
│  enum ValueEncoder ──┬── Dictionary        { offsets: FixedRegion, payload: VariableRegion }│
│                      └── FixedWidthEncoder { data: FixedRegion, codec: ScalarCodec }       │
│                                                                                            │
│  SortedIndex  { permutation: PackedInts }     search / sort / eq / not / gt / lt / between │
│  BitmapIndex  { rows: PackedInts, bitmap: FixedRegion }     implements RowMarker           │
│                                                                                            │
│  FixedRegion / VariableRegion  ──>  Region { blocks: Vec<u64> }  ──>  Arc<dyn Blob>        │
│                                                                                            │
│  trait Blob ──┬── MmapBlob   (memmap2, RwLock)                                             │
│               └── FileBlob   (positioned I/O, Mutex)                                       │
│                                                                                            │
└────────────────────────────────────────────────────────────────────────────────────────────┘

 Column file:

   0        16        32              16*(k+1)       16*(n+1)
   ┌────────┬─────────┬──── ... ──────┬──────────────┬──────────────────────────────────┐
   │ bump   │ slot 0  │               │ slot n-1     │ blocks: [body][link u64][8 rsvd] │
   │ u64    │ [state][first block]    │              │ ...                              │
   └────────┴─────────┴──── ... ──────┴──────────────┴──────────────────────────────────┘
*/
