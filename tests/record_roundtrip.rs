//! A compressed record must survive a full serialize/deserialize cycle with
//! the decoded stream unchanged, across the adaptive and fixed paths alike.

use chrono::{DateTime, TimeZone, Utc};
use template_compress::{decode_all, Engine, EngineConfig, Record, Sample};

fn ts(i: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap()
}

fn sample(i: i64, value: f64) -> Sample {
    Sample::new(ts(i), value).unwrap()
}

#[test]
fn record_round_trips_through_json_and_decodes_identically() {
    let mut cfg = EngineConfig::default();
    cfg.block_size = 6;
    cfg.min_block_size = 6;
    cfg.max_block_size = 6;
    let mut engine = Engine::new(cfg, "sensor-9").unwrap();
    let samples: Vec<Sample> = (0..60)
        .map(|i| sample(i, ((i % 6) as f64).sin()))
        .collect();
    let record = engine.compress_batch(samples).unwrap();

    let json = record.to_json().unwrap();
    let reloaded = Record::from_json(&json).unwrap();
    assert_eq!(reloaded, record);

    let original_decoded: Vec<f64> = decode_all(&record)
        .into_iter()
        .map(|r| r.unwrap().value)
        .collect();
    let reloaded_decoded: Vec<f64> = decode_all(&reloaded)
        .into_iter()
        .map(|r| r.unwrap().value)
        .collect();
    assert_eq!(original_decoded, reloaded_decoded);
}

#[test]
fn empty_input_is_rejected_before_any_record_is_built() {
    let mut cfg = EngineConfig::default();
    cfg.block_size = 4;
    cfg.min_block_size = 4;
    cfg.max_block_size = 4;
    let mut engine = Engine::new(cfg, "sensor-9").unwrap();
    let record = engine.compress_batch(Vec::<Sample>::new());
    assert!(record.is_err());
}

#[test]
fn metadata_survives_the_round_trip() {
    let mut cfg = EngineConfig::default();
    cfg.block_size = 4;
    cfg.min_block_size = 4;
    cfg.max_block_size = 4;
    let mut engine = Engine::new(cfg, "sensor-9").unwrap();
    let samples: Vec<Sample> = (0..40).map(|i| sample(i, 3.0)).collect();
    let record = engine.compress_batch(samples).unwrap();

    let json = record.to_json().unwrap();
    let reloaded = Record::from_json(&json).unwrap();
    assert_eq!(reloaded.metadata.num_templates, record.metadata.num_templates);
    assert!((reloaded.metadata.compression_ratio - record.metadata.compression_ratio).abs() < 1e-9);
}
