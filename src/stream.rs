//! Stream state (C7): the encoded-block variant and the per-run
//! accumulator (counters, block-size history, per-block similarity/CER
//! arrays) that `Engine` folds over as it consumes samples.

use crate::template::TemplateId;

/// One block as written to the encoded stream, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedBlock {
    /// Cites an existing template instead of carrying values.
    Reference {
        template_id: TemplateId,
        similarity_score: f64,
        cer: f64,
        length: usize,
    },
    /// Promotes this block to a new template; carries its values.
    Template {
        template_id: TemplateId,
        length: usize,
        values: Vec<f64>,
    },
}

impl EncodedBlock {
    pub fn template_id(&self) -> TemplateId {
        match self {
            EncodedBlock::Reference { template_id, .. } => *template_id,
            EncodedBlock::Template { template_id, .. } => *template_id,
        }
    }

    pub fn length(&self) -> usize {
        match self {
            EncodedBlock::Reference { length, .. } => *length,
            EncodedBlock::Template { length, .. } => *length,
        }
    }

    pub fn similarity_score(&self) -> f64 {
        match self {
            EncodedBlock::Reference { similarity_score, .. } => *similarity_score,
            EncodedBlock::Template { .. } => 1.0,
        }
    }

    pub fn cer(&self) -> f64 {
        match self {
            EncodedBlock::Reference { cer, .. } => *cer,
            EncodedBlock::Template { .. } => 0.0,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, EncodedBlock::Reference { .. })
    }
}

/// Accumulates everything the final record needs: the encoded stream
/// itself, hit/trial totals, and the per-block similarity/CER arrays.
///
/// Block-size history lives in [`crate::controller::BlockSizeController`];
/// `StreamState` only holds what §3 attributes to "stream state" beyond the
/// controller's own bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct StreamState {
    pub encoded_stream: Vec<EncodedBlock>,
    pub trials: u64,
    pub hits: u64,
    pub similarity_scores: Vec<f64>,
    pub cers: Vec<f64>,
}

impl StreamState {
    pub fn new() -> Self {
        StreamState::default()
    }

    pub fn push(&mut self, block: EncodedBlock) {
        self.trials += 1;
        if block.is_reference() {
            self.hits += 1;
        }
        self.similarity_scores.push(block.similarity_score());
        self.cers.push(block.cer());
        self.encoded_stream.push(block);
    }

    pub fn hit_ratio(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.hits as f64 / self.trials as f64
        }
    }

    /// Arithmetic mean of per-block similarity scores, Template blocks
    /// included at 1.0 (the pinned Open Question decision, DESIGN.md).
    pub fn avg_similarity(&self) -> f64 {
        mean(&self.similarity_scores)
    }

    pub fn avg_cer(&self) -> f64 {
        mean(&self.cers)
    }

    pub fn total_values(&self) -> u64 {
        self.encoded_stream.iter().map(|b| b.length() as u64).sum()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
