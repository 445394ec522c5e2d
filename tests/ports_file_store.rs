//! Drives the file-backed ports end to end: write samples to the ingest
//! directory, fetch and compress them, persist the record, and look it back
//! up by id and by device.

use chrono::{DateTime, TimeZone, Utc};
use template_compress::ports::{FileRecordStore, FileSampleStore, RecordLookup, RecordSink, SampleSource};
use template_compress::{Engine, EngineConfig};

fn ts(i: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap()
}

fn write_samples(root: &std::path::Path, device_id: &str, count: usize) {
    std::fs::create_dir_all(root.join("samples")).unwrap();
    let values: Vec<_> = (0..count)
        .map(|i| {
            serde_json::json!({
                "timestamp": ts(i as i64).to_rfc3339(),
                "value": (i % 5) as f64,
            })
        })
        .collect();
    std::fs::write(
        root.join("samples").join(format!("{device_id}.json")),
        serde_json::Value::Array(values).to_string(),
    )
    .unwrap();
}

#[test]
fn fetch_compress_save_and_look_up_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    write_samples(dir.path(), "device-7", 50);

    let source = FileSampleStore::new(dir.path());
    let samples = source.fetch("device-7", usize::MAX).unwrap();
    assert_eq!(samples.len(), 50);

    let mut cfg = EngineConfig::default();
    cfg.block_size = 5;
    cfg.min_block_size = 5;
    cfg.max_block_size = 5;
    let mut engine = Engine::new(cfg, "device-7").unwrap();
    let record = engine.compress_batch(samples).unwrap();

    let sink = FileRecordStore::new(dir.path());
    let id = sink.save(&record).unwrap();

    let lookup = FileRecordStore::new(dir.path());
    let loaded = lookup.by_id(id).unwrap();
    assert_eq!(loaded, record);

    let by_device = lookup.by_device("device-7", None).unwrap();
    assert_eq!(by_device.len(), 1);
    assert_eq!(by_device[0], record);
}

#[test]
fn fetch_respects_the_limit_argument() {
    let dir = tempfile::tempdir().unwrap();
    write_samples(dir.path(), "device-8", 50);

    let source = FileSampleStore::new(dir.path());
    let samples = source.fetch("device-8", 10).unwrap();
    assert_eq!(samples.len(), 10);
}

#[test]
fn fetching_an_unknown_device_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let source = FileSampleStore::new(dir.path());
    assert!(source.fetch("ghost", 10).is_err());
}

#[test]
fn records_from_different_devices_do_not_collide() {
    let dir = tempfile::tempdir().unwrap();
    write_samples(dir.path(), "device-a", 20);
    write_samples(dir.path(), "device-b", 20);

    let source = FileSampleStore::new(dir.path());
    let sink = FileRecordStore::new(dir.path());

    let mut cfg = EngineConfig::default();
    cfg.block_size = 4;
    cfg.min_block_size = 4;
    cfg.max_block_size = 4;

    let mut engine_a = Engine::new(cfg.clone(), "device-a").unwrap();
    let record_a = engine_a
        .compress_batch(source.fetch("device-a", usize::MAX).unwrap())
        .unwrap();
    let id_a = sink.save(&record_a).unwrap();

    let mut engine_b = Engine::new(cfg, "device-b").unwrap();
    let record_b = engine_b
        .compress_batch(source.fetch("device-b", usize::MAX).unwrap())
        .unwrap();
    let id_b = sink.save(&record_b).unwrap();

    assert_ne!(id_a.0, id_b.0);
    assert_eq!(sink.by_device("device-a", None).unwrap().len(), 1);
    assert_eq!(sink.by_device("device-b", None).unwrap().len(), 1);
}
