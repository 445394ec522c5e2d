//! Ports (A4): trait boundaries standing in for the out-of-scope ingestion
//! and persistence surfaces, plus a `DATABASE_URL`-keyed file-backed
//! reference implementation (a directory of JSON files).
//!
//! A real deployment would implement these traits against whatever
//! telemetry API and SQL schema it actually has; this crate ships only the
//! file-backed pair, enough to drive the CLI and integration tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PortError;
use crate::record::Record;
use crate::sample::Sample;

/// Opaque identifier for a persisted [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

/// Supplies ordered samples for a device. Stands in for the out-of-scope
/// third-party telemetry ingestion API.
pub trait SampleSource {
    fn fetch(&self, device_id: &str, limit: usize) -> Result<Vec<Sample>, PortError>;
}

/// Persists a finished compression run. Stands in for the out-of-scope SQL
/// persistence layer.
pub trait RecordSink {
    fn save(&self, record: &Record) -> Result<RecordId, PortError>;
}

/// Looks up previously persisted records.
pub trait RecordLookup {
    fn by_id(&self, id: RecordId) -> Result<Record, PortError>;
    fn by_device(
        &self,
        device_id: &str,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Record>, PortError>;
}

/// The `file://`-style directory path a `DATABASE_URL` resolves to.
///
/// Accepts either a bare path or a `file://` URL; any other scheme is
/// rejected since this crate ships no other backend (§1, §6).
pub fn resolve_database_path(database_url: &str) -> Result<PathBuf, PortError> {
    match database_url.strip_prefix("file://") {
        Some(rest) => Ok(PathBuf::from(rest)),
        None if database_url.contains("://") => Err(PortError::NotFound(format!(
            "unsupported DATABASE_URL scheme: {database_url}"
        ))),
        None => Ok(PathBuf::from(database_url)),
    }
}

/// One row of the sample-source JSON file: `samples/<device_id>.json`, an
/// array of `{timestamp, value}` objects in arrival order.
#[derive(Debug, Serialize, Deserialize)]
struct StoredSample {
    timestamp: DateTime<Utc>,
    value: f64,
}

/// A directory of `samples/<device_id>.json` files.
pub struct FileSampleStore {
    root: PathBuf,
}

impl FileSampleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSampleStore { root: root.into() }
    }

    fn path_for(&self, device_id: &str) -> PathBuf {
        self.root.join("samples").join(format!("{device_id}.json"))
    }
}

impl SampleSource for FileSampleStore {
    fn fetch(&self, device_id: &str, limit: usize) -> Result<Vec<Sample>, PortError> {
        let path = self.path_for(device_id);
        if !path.exists() {
            return Err(PortError::NotFound(format!(
                "no samples recorded for device {device_id:?}"
            )));
        }
        let text = fs::read_to_string(&path)?;
        let stored: Vec<StoredSample> = serde_json::from_str(&text)?;
        let samples = stored
            .into_iter()
            .take(limit)
            .filter_map(|s| Sample::new(s.timestamp, s.value))
            .collect();
        Ok(samples)
    }
}

/// A directory of `records/<id>.json` files plus a `records/index.json`
/// mapping device ids to the record ids saved for them, in save order.
pub struct FileRecordStore {
    root: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordIndex {
    /// Next id to assign; ids are never reused.
    next_id: u64,
    /// device_id -> record ids saved for that device, oldest first.
    by_device: BTreeMap<String, Vec<u64>>,
}

impl FileRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileRecordStore { root: root.into() }
    }

    fn records_dir(&self) -> PathBuf {
        self.root.join("records")
    }

    fn index_path(&self) -> PathBuf {
        self.records_dir().join("index.json")
    }

    fn record_path(&self, id: RecordId) -> PathBuf {
        self.records_dir().join(format!("{}.json", id.0))
    }

    fn load_index(&self) -> Result<RecordIndex, PortError> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(RecordIndex::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn save_index(&self, index: &RecordIndex) -> Result<(), PortError> {
        fs::write(self.index_path(), serde_json::to_string_pretty(index)?)?;
        Ok(())
    }
}

impl RecordSink for FileRecordStore {
    fn save(&self, record: &Record) -> Result<RecordId, PortError> {
        fs::create_dir_all(self.records_dir())?;
        let mut index = self.load_index()?;
        let id = RecordId(index.next_id);
        index.next_id += 1;
        index
            .by_device
            .entry(record.device_id.clone())
            .or_default()
            .push(id.0);

        let json = record.to_json_pretty().map_err(|e| {
            PortError::NotFound(format!("record failed to serialize: {e}"))
        })?;
        fs::write(self.record_path(id), json)?;
        self.save_index(&index)?;
        Ok(id)
    }
}

impl RecordLookup for FileRecordStore {
    fn by_id(&self, id: RecordId) -> Result<Record, PortError> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(PortError::NotFound(format!("no record with id {}", id.0)));
        }
        let text = fs::read_to_string(path)?;
        Record::from_json(&text)
            .map_err(|e| PortError::NotFound(format!("malformed record {}: {e}", id.0)))
    }

    fn by_device(
        &self,
        device_id: &str,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Record>, PortError> {
        let index = self.load_index()?;
        let ids = index.by_device.get(device_id).cloned().unwrap_or_default();
        let mut records = Vec::new();
        for id in ids {
            let record = self.by_id(RecordId(id))?;
            let in_range = match (range, record.time_range) {
                (Some((start, end)), Some((r_start, r_end))) => r_start >= start && r_end <= end,
                (Some(_), None) => false,
                (None, _) => true,
            };
            if in_range {
                records.push(record);
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CompressionMetadata;
    use crate::stream::EncodedBlock;
    use crate::template::TemplateId;
    use chrono::TimeZone;

    fn ts(mins: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + mins * 60, 0).unwrap()
    }

    fn sample_record(device_id: &str) -> Record {
        let mut templates = BTreeMap::new();
        templates.insert(TemplateId(0), vec![1.0, 2.0]);
        Record {
            device_id: device_id.to_string(),
            templates,
            encoded_stream: vec![EncodedBlock::Template {
                template_id: TemplateId(0),
                length: 2,
                values: vec![1.0, 2.0],
            }],
            metadata: CompressionMetadata {
                compression_ratio: 1.0,
                hit_ratio: 0.0,
                avg_cer: 0.0,
                total_values: 2,
                num_templates: 1,
            },
            time_range: Some((ts(0), ts(1))),
        }
    }

    #[test]
    fn resolve_database_path_strips_file_scheme() {
        assert_eq!(
            resolve_database_path("file:///tmp/db").unwrap(),
            PathBuf::from("/tmp/db")
        );
        assert_eq!(
            resolve_database_path("/tmp/db").unwrap(),
            PathBuf::from("/tmp/db")
        );
    }

    #[test]
    fn resolve_database_path_rejects_other_schemes() {
        assert!(resolve_database_path("postgres://localhost/db").is_err());
    }

    #[test]
    fn file_sample_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSampleStore::new(dir.path());
        fs::create_dir_all(dir.path().join("samples")).unwrap();
        let payload = serde_json::json!([
            {"timestamp": "2024-01-01T00:00:00Z", "value": 1.0},
            {"timestamp": "2024-01-01T00:01:00Z", "value": 2.0},
        ]);
        fs::write(
            dir.path().join("samples/device-1.json"),
            payload.to_string(),
        )
        .unwrap();

        let samples = store.fetch("device-1", 10).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].value(), 2.0);
    }

    #[test]
    fn file_sample_store_missing_device_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSampleStore::new(dir.path());
        assert!(matches!(
            store.fetch("nope", 10),
            Err(PortError::NotFound(_))
        ));
    }

    #[test]
    fn file_record_store_save_and_lookup_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());
        let record = sample_record("device-1");
        let id = store.save(&record).unwrap();
        let loaded = store.by_id(id).unwrap();
        assert_eq!(loaded, record);
    }

    #[test]
    fn file_record_store_ids_never_reused() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());
        let a = store.save(&sample_record("device-1")).unwrap();
        let b = store.save(&sample_record("device-1")).unwrap();
        assert!(a.0 < b.0);
    }

    #[test]
    fn file_record_store_by_device_filters_by_range() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());
        store.save(&sample_record("device-1")).unwrap();
        store.save(&sample_record("device-2")).unwrap();

        let all = store.by_device("device-1", None).unwrap();
        assert_eq!(all.len(), 1);

        let out_of_range = store
            .by_device("device-1", Some((ts(10), ts(20))))
            .unwrap();
        assert!(out_of_range.is_empty());
    }

    #[test]
    fn file_record_store_missing_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());
        assert!(matches!(
            store.by_id(RecordId(999)),
            Err(PortError::NotFound(_))
        ));
    }
}
