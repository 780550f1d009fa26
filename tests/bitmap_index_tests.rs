mod common;

use std::collections::BTreeMap;
use quanta::column::IndexedColumn;
use quanta::index::IndexState;
use quanta::{BitVector, Column, ColumnDef, Config, DataType, ErrorKind, IndexCardinality, Operator, Value};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use tempfile::tempdir;

fn rows(set: &BitVector) -> Vec<usize> {
    set.iter().collect()
}

fn as_indexed(column: &Column) -> &IndexedColumn {
    match column {
        Column::Indexed(c) => c,
        _ => panic!("column {} is not indexed", column.name()),
    }
}

fn symbols(config: &Config, file: &str, ceiling: u64) -> Column {
    let def = ColumnDef::indexed("sym", DataType::Dictionary { max_width: 8 }, ceiling);
    Column::open(def, &config.storage_path.join(file), config).unwrap()
}

#[test]
fn rebuilt_dictionary_column_answers_equality() {
    let dir = tempdir().unwrap();
    for (kind, config) in common::both_kinds(dir.path()) {
        let column = symbols(&config, &format!("b-{}.col", kind), 20);
        for s in ["A", "B", "A", "C", "A"] {
            column.add(s).unwrap();
        }
        assert_eq!(as_indexed(&column).distinct(), 3);
        assert_eq!(as_indexed(&column).index_state(), IndexState::Unbuilt);

        column.rebuild().unwrap();
        assert_eq!(as_indexed(&column).index_state(), IndexState::Built);

        assert_eq!(rows(&column.eq(&[Value::from("A")]).unwrap()), vec![0, 2, 4]);
        assert_eq!(rows(&column.eq(&[Value::from("B")]).unwrap()), vec![1]);
        assert_eq!(rows(&column.not(&[Value::from("A")]).unwrap()), vec![1, 3]);
        assert_eq!(rows(&column.eq(&[Value::from("Z")]).unwrap()), Vec::<usize>::new());
        assert_eq!(rows(&column.eq(&[Value::from("B"), Value::from("C")]).unwrap()), vec![1, 3]);

        assert_eq!(column.get(3).unwrap(), Value::from("C"));
        assert_eq!(as_indexed(&column).value_id(4).unwrap(), 0);
    }
}

#[test]
fn equality_matches_model_across_many_blocks() {
    let dir = tempdir().unwrap();
    let config = Config {
        rows_per_block: 64,
        bitmap_max_bytes: 256,
        ..common::small_config(dir.path())
    };
    let column = Column::open(
        ColumnDef::indexed("n", DataType::Int, IndexCardinality::Tiny),
        &dir.path().join("n.col"),
        &config,
    )
    .unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let mut model: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for row in 0..20_000usize {
        // one value shows up exactly once
        let v = if row == 12_345 { 999 } else { rng.gen_range(0..30) };
        column.add(v).unwrap();
        model.entry(v).or_default().push(row);
    }
    column.rebuild().unwrap();

    let meta = column.meta(config.meta_preview_limit).unwrap();
    assert_eq!(meta.distinct, Some(model.len() as u64));
    assert!(meta.index_built);

    for (v, expected) in &model {
        let got = rows(&column.eq(&[Value::Int(*v)]).unwrap());
        assert_eq!(&got, expected, "value {}", v);
    }
    assert_eq!(rows(&column.eq(&[Value::Int(999)]).unwrap()), vec![12_345]);
    assert!(rows(&column.eq(&[Value::Int(500)]).unwrap()).is_empty());

    let gt: usize = model.range(25..).map(|(_, r)| r.len()).sum();
    assert_eq!(column.gt(Value::Int(24)).unwrap().cardinality(), gt);
    let lt: usize = model.range(..5).map(|(_, r)| r.len()).sum();
    assert_eq!(column.lt(Value::Int(5)).unwrap().cardinality(), lt);
    let between: usize = model.range(10..20).map(|(_, r)| r.len()).sum();
    assert_eq!(column.between(Value::Int(10), Value::Int(20)).unwrap().cardinality(), between);

    let eq = column.eq(&[Value::Int(3), Value::Int(4)]).unwrap();
    let not = column.not(&[Value::Int(3), Value::Int(4)]).unwrap();
    let mut overlap = eq.clone();
    overlap.and(&not);
    assert_eq!(overlap.cardinality(), 0);
    assert_eq!(eq.cardinality() + not.cardinality(), 20_000);
}

#[test]
fn queries_before_rebuild_use_the_previous_bitmap() {
    let dir = tempdir().unwrap();
    let config = common::small_config(dir.path());
    let column = symbols(&config, "stale.col", 20);

    for s in ["X", "Y", "X"] {
        column.add(s).unwrap();
    }
    // nothing built yet
    assert_eq!(column.eq(&[Value::from("X")]).unwrap().cardinality(), 0);

    column.rebuild().unwrap();
    column.add("Z").unwrap();
    assert_eq!(as_indexed(&column).index_state(), IndexState::Unbuilt);
    assert_eq!(rows(&column.eq(&[Value::from("X")]).unwrap()), vec![0, 2]);
    assert_eq!(rows(&column.eq(&[Value::from("Z")]).unwrap()), Vec::<usize>::new());

    column.rebuild().unwrap();
    assert_eq!(rows(&column.eq(&[Value::from("Z")]).unwrap()), vec![3]);
}

#[test]
fn rebuild_over_ceiling_is_skipped() {
    let dir = tempdir().unwrap();
    let config = common::small_config(dir.path());
    let column = symbols(&config, "cap.col", 3);

    for s in ["a", "b", "c"] {
        column.add(s).unwrap();
    }
    column.rebuild().unwrap();
    assert_eq!(rows(&column.eq(&[Value::from("b")]).unwrap()), vec![1]);

    column.add("d").unwrap();
    let err = column.try_rebuild().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
    assert!(column.rebuild().is_ok());

    assert_eq!(as_indexed(&column).index_state(), IndexState::Unbuilt);
    assert!(rows(&column.eq(&[Value::from("b")]).unwrap()).is_empty());
    assert!(!column.meta(10).unwrap().index_built);
    // rows and labels still work
    assert_eq!(column.get(3).unwrap(), Value::from("d"));
    assert_eq!(column.all_labels().unwrap(), vec!["a", "b", "c", "d"]);
}

#[test]
fn value_ids_past_packed_width_are_rejected() {
    let dir = tempdir().unwrap();
    let config = common::small_config(dir.path());
    let column = Column::open(
        ColumnDef::indexed("n", DataType::Int, 20u64),
        &dir.path().join("wide.col"),
        &config,
    )
    .unwrap();

    for v in 0..256 {
        column.add(v).unwrap();
    }
    let err = column.add(256).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
    assert_eq!(column.len(), 256);
    assert_eq!(as_indexed(&column).distinct(), 256);
    // existing values still go in
    assert_eq!(column.add(17).unwrap(), 256);
}

#[test]
fn built_index_survives_reopen() {
    let dir = tempdir().unwrap();
    for (kind, config) in common::both_kinds(dir.path()) {
        let path = dir.path().join(format!("re-{}.col", kind));
        let def = ColumnDef::indexed("sym", DataType::Dictionary { max_width: 8 }, 20u64);
        {
            let column = Column::open(def.clone(), &path, &config).unwrap();
            for s in ["A", "B", "A", "C", "A", "B"] {
                column.add(s).unwrap();
            }
            column.rebuild().unwrap();
            column.close().unwrap();
        }

        let column = Column::open(def, &path, &config).unwrap();
        assert_eq!(column.len(), 6);
        assert_eq!(as_indexed(&column).index_state(), IndexState::Built);
        assert_eq!(rows(&column.eq(&[Value::from("B")]).unwrap()), vec![1, 5]);

        column.add("C").unwrap();
        assert_eq!(as_indexed(&column).index_state(), IndexState::Unbuilt);
        column.rebuild().unwrap();
        assert_eq!(rows(&column.eq(&[Value::from("C")]).unwrap()), vec![3, 6]);
    }
}

#[test]
fn stale_index_stays_unbuilt_after_reopen() {
    let dir = tempdir().unwrap();
    for (kind, config) in common::both_kinds(dir.path()) {
        let path = dir.path().join(format!("stale-{}.col", kind));
        let def = ColumnDef::indexed("sym", DataType::Dictionary { max_width: 8 }, 20u64);
        {
            let column = Column::open(def.clone(), &path, &config).unwrap();
            for s in ["A", "B", "A"] {
                column.add(s).unwrap();
            }
            column.rebuild().unwrap();
            column.add("A").unwrap();
            column.add("C").unwrap();
            assert_eq!(as_indexed(&column).index_state(), IndexState::Unbuilt);
            column.close().unwrap();
        }

        let column = Column::open(def, &path, &config).unwrap();
        assert_eq!(as_indexed(&column).index_state(), IndexState::Unbuilt, "{}", kind);
        assert!(!column.meta(10).unwrap().index_built);
        // the stored bitmap still answers for the values it covers
        assert_eq!(rows(&column.eq(&[Value::from("B")]).unwrap()), vec![1]);
        assert!(rows(&column.eq(&[Value::from("C")]).unwrap()).is_empty());

        column.rebuild().unwrap();
        assert_eq!(as_indexed(&column).index_state(), IndexState::Built);
        assert_eq!(rows(&column.eq(&[Value::from("A")]).unwrap()), vec![0, 2, 3]);
        assert_eq!(rows(&column.eq(&[Value::from("C")]).unwrap()), vec![4]);
    }
}

#[test]
fn reopened_bitmap_keeps_its_block_length() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("n.col");
    let def = ColumnDef::indexed("n", DataType::Int, IndexCardinality::Tiny);
    let tight = Config {
        bitmap_max_bytes: 64,
        ..common::small_config(dir.path())
    };
    {
        let column = Column::open(def.clone(), &path, &tight).unwrap();
        for row in 0..2_000 {
            column.add(row % 20).unwrap();
        }
        column.rebuild().unwrap();
        column.close().unwrap();
    }

    // a roomier ceiling would pick a shorter block length for the same rows
    let roomy = common::small_config(dir.path());
    let column = Column::open(def, &path, &roomy).unwrap();
    assert_eq!(as_indexed(&column).index_state(), IndexState::Built);
    let expected: Vec<usize> = (0..2_000).filter(|r| r % 20 == 7).collect();
    assert_eq!(rows(&column.eq(&[Value::Int(7)]).unwrap()), expected);
}

#[test]
fn metadata_lists_distinct_values_in_id_order() {
    let dir = tempdir().unwrap();
    let config = common::small_config(dir.path());
    let column = symbols(&config, "meta.col", 20);
    for s in ["SPY", "QQQ", "SPY", "GLD"] {
        column.add(s).unwrap();
    }

    let meta = column.meta(10).unwrap();
    assert_eq!(meta.name, "sym");
    assert_eq!(meta.data, "text");
    assert_eq!(meta.rows, 4);
    assert_eq!(meta.values, vec!["SPY", "QQQ", "GLD"]);

    assert!(column.meta(3).unwrap().values.is_empty());
    assert_eq!(
        column.labels(Operator::Not, &[Value::from("SPY")]).unwrap(),
        vec!["GLD", "QQQ"]
    );
}
