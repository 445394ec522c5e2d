//! Error types for the compression engine, the record codec, and the ports
//! that stand in for the out-of-scope ingestion/persistence surfaces.
//!
//! The library never panics on bad caller input; every fallible boundary
//! returns one of the enums below. The CLI binary wraps these in
//! `anyhow::Context` for human-readable messages.

use thiserror::Error;

/// Errors raised while constructing or running the engine.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// A config value violates an invariant (e.g. `min_block_size >
    /// max_block_size`, a threshold outside `[0, 1]`, or a zero capacity).
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// `compress_batch` was called with no samples.
    #[error("no samples supplied to compress")]
    EmptyInput,
}

/// Errors raised while decoding a compressed record.
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// A `Reference` block named a `template_id` absent from the record's
    /// template table.
    #[error("reference to unknown template id {0}")]
    DanglingReference(u64),

    /// The record could not be parsed into a decodable shape (e.g. an
    /// `encoded_stream` entry is missing required fields for its variant).
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

/// Errors raised by the codec (JSON (de)serialization of a [`crate::record::Record`]).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Errors raised by the file-backed ports (`SampleSource`, `RecordSink`,
/// `RecordLookup` implementations) that stand in for the out-of-scope
/// ingestion/persistence layers.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
