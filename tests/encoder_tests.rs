mod common;

use std::sync::Arc;
use quanta::blob::{open_blob, Blob};
use quanta::data::{PackedInts, ValueEncoder};
use quanta::{Config, DataType, ErrorKind, Value};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use tempfile::tempdir;

fn encoder(config: &Config, file: &str, data_type: &DataType) -> (Arc<dyn Blob>, ValueEncoder) {
    let blob = open_blob(
        config.blob_kind,
        config.storage_path.join(file),
        ValueEncoder::region_count(data_type),
        config,
    )
    .unwrap();
    let encoder = ValueEncoder::open(Arc::clone(&blob), 0, data_type, config).unwrap();
    (blob, encoder)
}

fn assert_display_round_trip(encoder: &ValueEncoder, v: Value) {
    let shown = encoder.to_display_string(&v);
    let parsed = encoder.parse(&Value::Str(shown.clone())).unwrap();
    assert_eq!(parsed, v, "display form {:?}", shown);
}

#[test]
fn display_then_parse_returns_the_value() {
    let dir = tempdir().unwrap();
    let config = common::small_config(dir.path());
    let mut rng = StdRng::seed_from_u64(11);

    let (_b, ints) = encoder(&config, "int.col", &DataType::Int);
    for v in [0, -1, i32::MIN, i32::MAX, rng.gen_range(-1000..1000)] {
        assert_display_round_trip(&ints, Value::Int(v));
    }

    let (_b, doubles) = encoder(&config, "double.col", &DataType::Double);
    for v in [0.0, -2.5, 0.1, 1e300, f64::MIN_POSITIVE, rng.gen_range(-1.0e6..1.0e6)] {
        assert_display_round_trip(&doubles, Value::Double(v));
    }

    let (_b, bools) = encoder(&config, "bool.col", &DataType::Boolean);
    assert_display_round_trip(&bools, Value::Bool(true));
    assert_display_round_trip(&bools, Value::Bool(false));

    let (_b, dict) = encoder(&config, "dict.col", &DataType::Dictionary { max_width: 32 });
    for s in ["", "SPY", "with space", "ünïcode"] {
        assert_display_round_trip(&dict, Value::from(s));
    }

    let format = "%Y-%m-%d %H:%M:%S%.3f".to_string();
    let (_b, stamps) = encoder(&config, "ts.col", &DataType::Timestamp { format });
    for millis in [0i64, 1_709_214_310_123, rng.gen_range(0..4_000_000_000_000)] {
        assert_display_round_trip(&stamps, Value::Timestamp(millis));
    }
}

#[test]
fn value_ids_are_insertion_ordinals() {
    let dir = tempdir().unwrap();
    let config = common::small_config(dir.path());

    let (_b, mut dict) = encoder(&config, "d.col", &DataType::Dictionary { max_width: 16 });
    let words = ["GS", "GOOG", "XLF", "BAC", "HPQ", "GM", "FCX", "GLD", "SPY", "QQQ"];
    for (i, w) in words.iter().enumerate() {
        assert_eq!(dict.add(&Value::from(*w)).unwrap(), i as u32);
    }
    assert_eq!(dict.len(), words.len() as u64);
    assert_eq!(dict.get(3).unwrap(), Value::from("BAC"));

    let (_b, mut longs) = encoder(&config, "l.col", &DataType::Long);
    for i in 0..50i64 {
        longs.add(&Value::Long(i * 1_000_000_007)).unwrap();
    }
    assert_eq!(longs.get(49).unwrap(), Value::Long(49 * 1_000_000_007));
    assert_eq!(longs.get(50).unwrap_err().kind(), ErrorKind::Bounds);
}

#[test]
fn encoders_reject_wrong_kinds() {
    let dir = tempdir().unwrap();
    let config = common::small_config(dir.path());

    let (_b, mut dict) = encoder(&config, "d.col", &DataType::Dictionary { max_width: 4 });
    assert_eq!(dict.add(&Value::Int(3)).unwrap_err().kind(), ErrorKind::TypeMismatch);
    assert_eq!(dict.add(&Value::from("toolong")).unwrap_err().kind(), ErrorKind::InvalidInput);

    let (_b, ints) = encoder(&config, "i.col", &DataType::Int);
    assert_eq!(ints.parse(&Value::from("4.5")).unwrap_err().kind(), ErrorKind::TypeMismatch);
    assert_eq!(ints.parse(&Value::Null).unwrap_err().kind(), ErrorKind::TypeMismatch);

    let (_b, bools) = encoder(&config, "b.col", &DataType::Boolean);
    assert_eq!(bools.parse(&Value::from("maybe")).unwrap_err().kind(), ErrorKind::TypeMismatch);
}

#[test]
fn encoded_values_survive_reopen() {
    let dir = tempdir().unwrap();
    for (kind, config) in common::both_kinds(dir.path()) {
        let file = format!("fs-{}.col", kind);
        let data_type = DataType::FixedString { width: 5 };
        {
            let (blob, mut fixed) = encoder(&config, &file, &data_type);
            for s in ["a", "bb", "ccccccc"] {
                fixed.add(&fixed.parse(&Value::from(s)).unwrap()).unwrap();
            }
            blob.close().unwrap();
        }
        let (_b, fixed) = encoder(&config, &file, &data_type);
        assert_eq!(fixed.len(), 3);
        assert_eq!(fixed.get(2).unwrap(), Value::from("ccccc"));

        let dict_file = format!("dict-{}.col", kind);
        let dict_type = DataType::Dictionary { max_width: 64 };
        {
            let (blob, mut dict) = encoder(&config, &dict_file, &dict_type);
            for i in 0..100 {
                dict.add(&Value::from(format!("value-{}", i))).unwrap();
            }
            blob.close().unwrap();
        }
        let (_b, dict) = encoder(&config, &dict_file, &dict_type);
        assert_eq!(dict.get(99).unwrap(), Value::from("value-99"));
    }
}

#[test]
fn packed_ints_choose_width_and_reject_overflow() {
    let dir = tempdir().unwrap();
    let config = common::small_config(dir.path());
    let blob = open_blob(config.blob_kind, dir.path().join("p.col"), 2, &config).unwrap();

    let mut tiny = PackedInts::open(Arc::clone(&blob), 0, 20, config.rows_per_block).unwrap();
    assert_eq!(tiny.width(), 1);
    tiny.add(255).unwrap();
    assert_eq!(tiny.add(256).unwrap_err().kind(), ErrorKind::CapacityExceeded);
    assert_eq!(tiny.len(), 1);

    let mut wide = PackedInts::open(Arc::clone(&blob), 1, 100_000, config.rows_per_block).unwrap();
    assert_eq!(wide.width(), 3);
    for v in [0u32, 70_000, 16_777_215] {
        wide.add(v).unwrap();
    }
    wide.insert(1, 5).unwrap();
    assert_eq!(wide.get(1).unwrap(), 5);
    assert_eq!(wide.get(3).unwrap(), 16_777_215);
    assert_eq!(wide.to_bytes(70_000).len(), 3);
    assert_eq!(wide.parse(&Value::from("12")).unwrap(), 12);
    assert_eq!(wide.to_display_string(12), "12");
}
