//! Compressed record (§3) and its codec (C9): the persisted unit for one
//! compression run, and the self-describing JSON document it serializes to.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::finite::{FiniteOr, InstantSeconds};
use crate::stream::EncodedBlock;
use crate::template::TemplateId;

/// Derived, run-level compression metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionMetadata {
    pub compression_ratio: f64,
    pub hit_ratio: f64,
    pub avg_cer: f64,
    pub total_values: u64,
    pub num_templates: usize,
}

/// The persisted unit for one compression run over one device.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub device_id: String,
    pub templates: BTreeMap<TemplateId, Vec<f64>>,
    pub encoded_stream: Vec<EncodedBlock>,
    pub metadata: CompressionMetadata,
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl Record {
    /// Serialize to the canonical JSON document (§4.9, §6).
    pub fn to_json(&self) -> Result<String, CodecError> {
        let wire = WireRecord::from(self);
        serde_json::to_string(&wire).map_err(CodecError::Json)
    }

    /// Serialize to a pretty-printed JSON document, for `--save-result`
    /// files a human might open.
    pub fn to_json_pretty(&self) -> Result<String, CodecError> {
        let wire = WireRecord::from(self);
        serde_json::to_string_pretty(&wire).map_err(CodecError::Json)
    }

    /// Deserialize from the canonical JSON document. Unknown fields are
    /// ignored, not rejected (forward compatibility, §4.9).
    pub fn from_json(s: &str) -> Result<Record, CodecError> {
        let wire: WireRecord = serde_json::from_str(s).map_err(CodecError::Json)?;
        Record::try_from(wire)
    }
}

// ── Wire schema ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct WireRecord {
    device_id: String,
    templates: BTreeMap<String, Vec<FiniteOr>>,
    encoded_stream: Vec<WireBlock>,
    compression_metadata: WireMetadata,
    #[serde(default)]
    time_range: Option<WireTimeRange>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireBlock {
    template_id: u64,
    similarity_score: FiniteOr,
    cer: FiniteOr,
    length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<FiniteOr>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMetadata {
    compression_ratio: FiniteOr,
    hit_ratio: FiniteOr,
    avg_cer: FiniteOr,
    total_values: u64,
    num_templates: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireTimeRange {
    start: InstantSeconds,
    end: InstantSeconds,
}

impl From<&Record> for WireRecord {
    fn from(record: &Record) -> Self {
        let templates = record
            .templates
            .iter()
            .map(|(id, values)| {
                (
                    id.0.to_string(),
                    values.iter().map(|v| FiniteOr(*v)).collect(),
                )
            })
            .collect();

        let encoded_stream = record
            .encoded_stream
            .iter()
            .map(|block| match block {
                EncodedBlock::Reference {
                    template_id,
                    similarity_score,
                    cer,
                    length,
                } => WireBlock {
                    template_id: template_id.0,
                    similarity_score: FiniteOr(*similarity_score),
                    cer: FiniteOr(*cer),
                    length: *length,
                    values: None,
                },
                EncodedBlock::Template {
                    template_id,
                    length,
                    values,
                } => WireBlock {
                    template_id: template_id.0,
                    similarity_score: FiniteOr(1.0),
                    cer: FiniteOr(0.0),
                    length: *length,
                    values: Some(values.iter().map(|v| FiniteOr(*v)).collect()),
                },
            })
            .collect();

        WireRecord {
            device_id: record.device_id.clone(),
            templates,
            encoded_stream,
            compression_metadata: WireMetadata {
                compression_ratio: FiniteOr(record.metadata.compression_ratio),
                hit_ratio: FiniteOr(record.metadata.hit_ratio),
                avg_cer: FiniteOr(record.metadata.avg_cer),
                total_values: record.metadata.total_values,
                num_templates: record.metadata.num_templates,
            },
            time_range: record.time_range.map(|(start, end)| WireTimeRange {
                start: InstantSeconds(start),
                end: InstantSeconds(end),
            }),
        }
    }
}

impl TryFrom<WireRecord> for Record {
    type Error = CodecError;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        let mut templates = BTreeMap::new();
        for (key, values) in wire.templates {
            let id: u64 = key
                .parse()
                .map_err(|_| CodecError::Malformed(format!("bad template id key {key:?}")))?;
            templates.insert(
                TemplateId(id),
                values.into_iter().map(f64::from).collect(),
            );
        }

        let encoded_stream = wire
            .encoded_stream
            .into_iter()
            .map(|block| -> Result<EncodedBlock, CodecError> {
                match block.values {
                    Some(values) => Ok(EncodedBlock::Template {
                        template_id: TemplateId(block.template_id),
                        length: block.length,
                        values: values.into_iter().map(f64::from).collect(),
                    }),
                    None => Ok(EncodedBlock::Reference {
                        template_id: TemplateId(block.template_id),
                        similarity_score: block.similarity_score.into(),
                        cer: block.cer.into(),
                        length: block.length,
                    }),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Record {
            device_id: wire.device_id,
            templates,
            encoded_stream,
            metadata: CompressionMetadata {
                compression_ratio: wire.compression_metadata.compression_ratio.into(),
                hit_ratio: wire.compression_metadata.hit_ratio.into(),
                avg_cer: wire.compression_metadata.avg_cer.into(),
                total_values: wire.compression_metadata.total_values,
                num_templates: wire.compression_metadata.num_templates,
            },
            time_range: wire
                .time_range
                .map(|tr| (tr.start.0, tr.end.0)),
        })
    }
}
