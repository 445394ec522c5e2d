//! Decoder (C8): reconstructs a lazy sequence of (timestamp, value) pairs
//! from a compressed record.

use chrono::{DateTime, Duration, Utc};

use crate::error::DecodeError;
use crate::record::Record;
use crate::stream::EncodedBlock;

/// One reconstructed observation. `timestamp` is `None` when the record
/// carries no `time_range` (the caller is expected to supply timestamps
/// itself in that case).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedSample {
    pub timestamp: Option<DateTime<Utc>>,
    pub value: f64,
}

/// Per-block [start, end) timestamp interval, computed once up front from
/// the record's `time_range` so the iterator can interpolate within each
/// block without repeating the division.
#[derive(Debug, Clone, Copy)]
struct BlockInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

fn block_intervals(
    time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    num_blocks: usize,
) -> Option<Vec<BlockInterval>> {
    let (t0, t1) = time_range?;
    if num_blocks == 0 {
        return Some(Vec::new());
    }
    let total_ns = (t1 - t0).num_nanoseconds().unwrap_or(0) as f64;
    let per_block_ns = total_ns / num_blocks as f64;
    let mut intervals = Vec::with_capacity(num_blocks);
    for i in 0..num_blocks {
        let start_ns = per_block_ns * i as f64;
        let start = t0 + Duration::nanoseconds(start_ns as i64);
        let end = if i + 1 == num_blocks {
            t1
        } else {
            t0 + Duration::nanoseconds((per_block_ns * (i + 1) as f64) as i64)
        };
        intervals.push(BlockInterval { start, end });
    }
    Some(intervals)
}

/// Linearly interpolate `count` timestamps within `[interval.start,
/// interval.end)`, one per value in a block of that length.
fn interpolate(interval: BlockInterval, count: usize) -> Vec<DateTime<Utc>> {
    if count == 0 {
        return Vec::new();
    }
    let span_ns = (interval.end - interval.start).num_nanoseconds().unwrap_or(0) as f64;
    let stride_ns = span_ns / count as f64;
    (0..count)
        .map(|j| interval.start + Duration::nanoseconds((stride_ns * j as f64) as i64))
        .collect()
}

/// A lazy, `Iterator`-based decode of a [`Record`]'s encoded stream.
///
/// Once a [`DecodeError`] is yielded the iterator is exhausted: no later
/// block is decoded, matching the "fatal for that block... stop" policy.
pub struct Decoder<'a> {
    record: &'a Record,
    intervals: Option<Vec<BlockInterval>>,
    block_idx: usize,
    pending: std::vec::IntoIter<DecodedSample>,
    done: bool,
}

impl<'a> Decoder<'a> {
    pub fn new(record: &'a Record) -> Self {
        let intervals = block_intervals(record.time_range, record.encoded_stream.len());
        Decoder {
            record,
            intervals,
            block_idx: 0,
            pending: Vec::new().into_iter(),
            done: false,
        }
    }

    fn resolve_values(&self, block: &EncodedBlock) -> Result<Vec<f64>, DecodeError> {
        let values = match block {
            EncodedBlock::Template { values, .. } => values.clone(),
            EncodedBlock::Reference { template_id, .. } => self
                .record
                .templates
                .get(template_id)
                .cloned()
                .ok_or(DecodeError::DanglingReference(template_id.0))?,
        };
        if values.len() != block.length() {
            return Err(DecodeError::MalformedRecord(format!(
                "block at index {} declares length {} but resolves to {} values",
                self.block_idx,
                block.length(),
                values.len()
            )));
        }
        Ok(values)
    }

    fn load_next_block(&mut self) -> Option<Result<(), DecodeError>> {
        let block = self.record.encoded_stream.get(self.block_idx)?;
        let values = match self.resolve_values(block) {
            Ok(v) => v,
            Err(e) => return Some(Err(e)),
        };
        let timestamps: Vec<Option<DateTime<Utc>>> = match &self.intervals {
            Some(intervals) => interpolate(intervals[self.block_idx], values.len())
                .into_iter()
                .map(Some)
                .collect(),
            None => vec![None; values.len()],
        };
        let samples: Vec<DecodedSample> = values
            .into_iter()
            .zip(timestamps)
            .map(|(value, timestamp)| DecodedSample { timestamp, value })
            .collect();
        self.block_idx += 1;
        self.pending = samples.into_iter();
        Some(Ok(()))
    }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<DecodedSample, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(sample) = self.pending.next() {
                return Some(Ok(sample));
            }
            match self.load_next_block() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(())) => continue,
            }
        }
    }
}

/// Decode `record` into a `Vec`, stopping at the first error (inclusive).
pub fn decode_all(record: &Record) -> Vec<Result<DecodedSample, DecodeError>> {
    Decoder::new(record).collect()
}
