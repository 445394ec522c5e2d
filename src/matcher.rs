//! Matcher (C4): given a completed block, find the best-scoring template of
//! the same length above the acceptance threshold, or declare a miss.

use crate::similarity::similarity;
use crate::template::{TemplateId, TemplateStore};

/// Result of matching one block against the template store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    Hit { id: TemplateId, similarity: f64 },
    Miss,
}

/// Find the best match for `block` among templates of the same length.
///
/// Only templates whose stored length equals `block.len()` are considered
/// (C4: "Templates of differing length are not considered matches"). Among
/// those, the highest-similarity template strictly exceeding `p_threshold`
/// wins; ties are broken by smallest id by iterating the store in ascending
/// id order and only replacing the incumbent on a strictly greater score.
pub fn find_match(
    block: &[f64],
    store: &TemplateStore,
    p_threshold: f64,
    similarity_factor: f64,
    min_values: usize,
) -> MatchOutcome {
    let mut best: Option<(TemplateId, f64)> = None;
    for template in store.iter_of_length(block.len()) {
        let s = similarity(block, &template.values, similarity_factor, min_values);
        if s > p_threshold {
            match best {
                Some((_, best_s)) if s <= best_s => {}
                _ => best = Some((template.id, s)),
            }
        }
    }
    match best {
        Some((id, s)) => MatchOutcome::Hit { id, similarity: s },
        None => MatchOutcome::Miss,
    }
}
