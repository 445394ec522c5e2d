//! `Engine`: the public entry point tying the similarity metric, template
//! store, block buffer, matcher, block-size controller, and stream state
//! into one compress loop (C5).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::block_buffer::BlockBuffer;
use crate::config::EngineConfig;
use crate::controller::{self, BlockSizeController};
use crate::error::EngineError;
use crate::matcher::{find_match, MatchOutcome};
use crate::record::{CompressionMetadata, Record};
use crate::sample::Sample;
use crate::similarity::cer;
use crate::stream::{EncodedBlock, StreamState};
use crate::template::TemplateStore;

/// Mirrors the ingest wire shape (`ports::StoredSample`): what one original
/// `{timestamp, value}` reading costs on the wire, serialized the same way
/// the ports module would persist it. Used only to measure `original_bytes`
/// byte-accurately, never stored.
#[derive(Serialize)]
struct RawSample {
    timestamp: DateTime<Utc>,
    value: f64,
}

/// The block produced by one `push` call that crossed a block boundary,
/// tagged with its position in the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBlockOutcome {
    pub block_index: u64,
    pub block: EncodedBlock,
}

/// Point-in-time totals, exposed for callers that want to observe a run
/// without waiting for `finish`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub trials: u64,
    pub hits: u64,
    pub hit_ratio: f64,
    pub avg_similarity: f64,
    pub avg_cer: f64,
    pub num_templates: usize,
    pub current_block_size: usize,
    pub p_min: f64,
    pub rho_min: f64,
    pub switch_count: u32,
}

/// One compression run over one device's scalar sample stream.
///
/// Owns the template store and stream state exclusively for its lifetime;
/// see the module-level invariants in `stream.rs` and `template.rs`. Not
/// `Sync` in spirit (no internal synchronization), but safely `Send` — move
/// it to a worker thread rather than sharing it across threads.
pub struct Engine {
    config: EngineConfig,
    device_id: String,
    buffer: BlockBuffer,
    store: TemplateStore,
    controller: Option<BlockSizeController>,
    stream: StreamState,
    samples_since_prune: u64,
    blocks_emitted: u64,
    first_timestamp: Option<DateTime<Utc>>,
    last_timestamp: Option<DateTime<Utc>>,
    /// Running total of bytes each pushed sample would occupy serialized as
    /// a `RawSample` JSON array element (object bytes only; array
    /// punctuation is added once in `finish`). Accumulated incrementally so
    /// `Engine` never needs to retain the raw samples themselves.
    raw_object_bytes: u64,
    raw_count: u64,
}

impl Engine {
    pub fn new(config: EngineConfig, device_id: impl Into<String>) -> Result<Self, EngineError> {
        config.validate()?;
        let controller = if config.adaptive_block_size {
            Some(BlockSizeController::new(
                config.block_size,
                config.min_block_size,
                config.max_block_size,
                config.kmax,
                config.rmin,
                config.wc,
                config.confidence_level,
            ))
        } else {
            None
        };
        Ok(Engine {
            buffer: BlockBuffer::new(config.block_size),
            store: TemplateStore::new(config.max_templates),
            controller,
            stream: StreamState::new(),
            samples_since_prune: 0,
            blocks_emitted: 0,
            first_timestamp: None,
            last_timestamp: None,
            raw_object_bytes: 0,
            raw_count: 0,
            device_id: device_id.into(),
            config,
        })
    }

    /// Feed one sample. Returns the emitted block once this sample
    /// completes the current target length, `None` otherwise.
    pub fn push(&mut self, sample: Sample) -> Option<EncodedBlockOutcome> {
        self.first_timestamp.get_or_insert(sample.timestamp);
        self.last_timestamp = Some(sample.timestamp);

        let raw = RawSample {
            timestamp: sample.timestamp,
            value: sample.value(),
        };
        self.raw_object_bytes += serde_json::to_string(&raw)
            .map(|s| s.len() as u64)
            .unwrap_or(0);
        self.raw_count += 1;

        self.samples_since_prune += 1;
        if self.samples_since_prune >= self.config.clean_interval {
            self.store.prune();
            self.samples_since_prune = 0;
        }

        self.buffer
            .push(sample.value())
            .map(|values| self.process_block(values))
    }

    /// Run the matcher/encoder (C4/C5) over a completed block, fold the
    /// outcome into stream state and the controller, and latch the
    /// controller's current N as the buffer's next target.
    fn process_block(&mut self, values: Vec<f64>) -> EncodedBlockOutcome {
        let outcome = find_match(
            &values,
            &self.store,
            self.config.p_threshold,
            self.config.similarity_factor,
            self.config.min_values,
        );

        let block = match outcome {
            MatchOutcome::Hit { id, similarity } => {
                let cer_value = self
                    .store
                    .get(id)
                    .map(|t| cer(&values, &t.values))
                    .unwrap_or(0.0);
                self.store.bump(id);
                EncodedBlock::Reference {
                    template_id: id,
                    similarity_score: similarity,
                    cer: cer_value,
                    length: values.len(),
                }
            }
            MatchOutcome::Miss => {
                let length = values.len();
                let id = self.store.insert(values.clone());
                self.store.bump(id);
                EncodedBlock::Template {
                    template_id: id,
                    length,
                    values,
                }
            }
        };

        let is_hit = block.is_reference();
        let similarity_score = block.similarity_score();
        let cer_value = block.cer();
        self.stream.push(block.clone());

        if let Some(ctl) = &mut self.controller {
            ctl.record_outcome(is_hit, similarity_score, cer_value);
            self.buffer.set_next_target(ctl.current_n());
        }

        let block_index = self.blocks_emitted;
        self.blocks_emitted += 1;
        EncodedBlockOutcome { block_index, block }
    }

    /// Flush any partial block (as a Template, per §4.3) and produce the
    /// final record. Safe to call more than once; a second call simply
    /// reflects whatever state remains (an empty buffer flushes to nothing).
    pub fn finish(&mut self) -> Record {
        if let Some(values) = self.buffer.flush() {
            let length = values.len();
            let id = self.store.insert(values.clone());
            self.store.bump(id);
            let block = EncodedBlock::Template {
                template_id: id,
                length,
                values,
            };
            self.stream.push(block);
            self.blocks_emitted += 1;
        }

        let templates: BTreeMap<_, _> = self
            .store
            .iter()
            .map(|t| (t.id, t.values.clone()))
            .collect();
        let total_values = self.stream.total_values();

        let mut record = Record {
            device_id: self.device_id.clone(),
            templates,
            encoded_stream: self.stream.encoded_stream.clone(),
            metadata: CompressionMetadata {
                compression_ratio: 0.0,
                hit_ratio: self.stream.hit_ratio(),
                avg_cer: self.stream.avg_cer(),
                total_values,
                num_templates: self.store.len(),
            },
            time_range: match (self.first_timestamp, self.last_timestamp) {
                (Some(a), Some(b)) => Some((a, b)),
                _ => None,
            },
        };

        let serialized = record
            .to_json()
            .expect("an in-memory Record always serializes");
        let compressed_bytes = serialized.len().max(1);
        // Byte-accurate, not estimated: the bytes a JSON array of the
        // original `{timestamp, value}` readings would actually occupy,
        // array punctuation included.
        let original_bytes = if self.raw_count == 0 {
            2 // "[]"
        } else {
            self.raw_object_bytes + (self.raw_count - 1) + 2 // commas + "[" "]"
        };
        record.metadata.compression_ratio = original_bytes as f64 / compressed_bytes as f64;
        record
    }

    /// Push every sample in order, then finish the run.
    pub fn compress_batch(
        &mut self,
        samples: impl IntoIterator<Item = Sample>,
    ) -> Result<Record, EngineError> {
        let mut any = false;
        for sample in samples {
            any = true;
            self.push(sample);
        }
        if !any && self.buffer.is_empty() && self.stream.trials == 0 {
            return Err(EngineError::EmptyInput);
        }
        Ok(self.finish())
    }

    pub fn stats(&self) -> Stats {
        let (current_block_size, p_min, rho_min_value, switch_count) = match &self.controller {
            Some(ctl) => (ctl.current_n(), ctl.p_min(), ctl.rho_min(), ctl.switch_count()),
            None => {
                let p = self.stream.hit_ratio();
                (self.buffer.target(), p, controller::rho_min(self.buffer.target(), p), 0)
            }
        };
        Stats {
            trials: self.stream.trials,
            hits: self.stream.hits,
            hit_ratio: self.stream.hit_ratio(),
            avg_similarity: self.stream.avg_similarity(),
            avg_cer: self.stream.avg_cer(),
            num_templates: self.store.len(),
            current_block_size,
            p_min,
            rho_min: rho_min_value,
            switch_count,
        }
    }

    /// Reset all run state back to what `Engine::new` would produce for the
    /// same config, keeping `device_id` and `config`.
    pub fn reset(&mut self) {
        self.buffer = BlockBuffer::new(self.config.block_size);
        self.store = TemplateStore::new(self.config.max_templates);
        self.controller = if self.config.adaptive_block_size {
            Some(BlockSizeController::new(
                self.config.block_size,
                self.config.min_block_size,
                self.config.max_block_size,
                self.config.kmax,
                self.config.rmin,
                self.config.wc,
                self.config.confidence_level,
            ))
        } else {
            None
        };
        self.stream = StreamState::new();
        self.samples_since_prune = 0;
        self.blocks_emitted = 0;
        self.first_timestamp = None;
        self.last_timestamp = None;
        self.raw_object_bytes = 0;
        self.raw_count = 0;
    }
}
