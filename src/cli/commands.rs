//! Dispatch logic behind the `compress` / `decompress` subcommands.
//!
//! Kept separate from `args.rs` so the parsing and the I/O-touching
//! behaviour can be tested independently, mirroring the teacher's split
//! between argument parsing and the `run` dispatcher in `main.rs`.

use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::config::EngineConfig;
use crate::decoder::Decoder;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::ports::{resolve_database_path, FileRecordStore, FileSampleStore, RecordId};
use crate::ports::{RecordLookup, RecordSink, SampleSource};
use crate::record::Record;

/// Exit code 2: the documented "empty input" outcome for `compress` (§6).
pub const EXIT_EMPTY_INPUT: i32 = 2;

fn database_path(database_url: &str) -> Result<PathBuf> {
    resolve_database_path(database_url).context("resolving DATABASE_URL")
}

pub fn run_compress(
    database_url: &str,
    device_id: &str,
    limit: usize,
    save_result: Option<&PathBuf>,
    visualize: bool,
) -> Result<i32> {
    let root = database_path(database_url)?;
    let source = FileSampleStore::new(&root);
    let samples = source
        .fetch(device_id, limit)
        .with_context(|| format!("fetching samples for device {device_id:?}"))?;

    let mut engine = Engine::new(EngineConfig::default(), device_id)?;
    let record = match engine.compress_batch(samples) {
        Ok(record) => record,
        Err(EngineError::EmptyInput) => {
            tracing::warn!(device_id, "no samples to compress");
            return Ok(EXIT_EMPTY_INPUT);
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        device_id,
        trials = record.encoded_stream.len(),
        hit_ratio = record.metadata.hit_ratio,
        compression_ratio = record.metadata.compression_ratio,
        "compression_complete"
    );

    if visualize {
        print_summary(&record);
    }

    if let Some(path) = save_result {
        let sink = FileRecordStore::new(&root);
        let id = sink.save(&record).context("saving compressed record")?;
        let json = record
            .to_json_pretty()
            .context("serializing compressed record")?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).context("creating --save-result directory")?;
            }
        }
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("saved record {} to {}", id.0, path.display());
    }

    Ok(0)
}

pub fn run_decompress(
    database_url: &str,
    compression_id: Option<u64>,
    device_id: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    output: Option<&PathBuf>,
    list: bool,
) -> Result<i32> {
    let root = database_path(database_url)?;
    let store = FileRecordStore::new(&root);

    let records = match (compression_id, device_id) {
        (Some(id), _) => vec![store
            .by_id(RecordId(id))
            .with_context(|| format!("loading record {id}"))?],
        (None, Some(device_id)) => {
            let range = match (start_date, end_date) {
                (Some(s), Some(e)) => Some((parse_date_bound(s, false)?, parse_date_bound(e, true)?)),
                (None, None) => None,
                _ => bail!("--start-date and --end-date must be supplied together"),
            };
            store
                .by_device(device_id, range)
                .with_context(|| format!("loading records for device {device_id:?}"))?
        }
        (None, None) => bail!("either --compression-id or --device-id is required"),
    };

    if list {
        for record in &records {
            print_summary(record);
        }
        return Ok(0);
    }

    let mut out: Box<dyn std::io::Write> = match output {
        Some(path) => Box::new(fs::File::create(path).context("opening output file")?),
        None => Box::new(std::io::stdout()),
    };

    for record in &records {
        for decoded in Decoder::new(record) {
            let sample = decoded.context("decoding record")?;
            match sample.timestamp {
                Some(ts) => writeln!(out, "{},{}", ts.to_rfc3339(), sample.value)?,
                None => writeln!(out, ",{}", sample.value)?,
            }
        }
    }

    Ok(0)
}

fn parse_date_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date {raw:?}, expected YYYY-MM-DD or RFC3339"))?;
    let naive = if end_of_day {
        date.and_hms_opt(23, 59, 59).unwrap()
    } else {
        date.and_hms_opt(0, 0, 0).unwrap()
    };
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn print_summary(record: &Record) {
    println!(
        "device={} blocks={} templates={} hit_ratio={:.3} avg_cer={:.4} compression_ratio={:.2}",
        record.device_id,
        record.encoded_stream.len(),
        record.metadata.num_templates,
        record.metadata.hit_ratio,
        record.metadata.avg_cer,
        record.metadata.compression_ratio,
    );
}
