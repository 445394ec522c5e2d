//! Lossy, template-based compression for univariate time-series sensor
//! streams: buffer incoming samples into fixed- or adaptively-sized blocks,
//! match each block against a bounded store of previously seen shapes, and
//! emit either a reference to the matching template or a new template.

pub mod block_buffer;
pub mod cli;
pub mod config;
pub mod controller;
pub mod decoder;
pub mod engine;
pub mod error;
pub mod finite;
pub mod matcher;
pub mod ports;
pub mod record;
pub mod sample;
pub mod similarity;
pub mod stream;
pub mod template;

pub use config::EngineConfig;
pub use decoder::{decode_all, DecodedSample, Decoder};
pub use engine::{Engine, EncodedBlockOutcome, Stats};
pub use error::{CodecError, DecodeError, EngineError, PortError};
pub use record::{CompressionMetadata, Record};
pub use sample::{Reading, Sample};
pub use stream::EncodedBlock;
pub use template::TemplateId;
