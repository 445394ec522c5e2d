//! Similarity metric (C1): a cheap, bounded closeness measure between two
//! equal-length numeric vectors, used by the matcher (C4) to decide whether
//! a block can be replaced by a reference to an existing template.

/// Floor under which `max(|a|, |b|, 1.0)` never drops, preventing division
/// by a near-zero magnitude from blowing up the relative difference.
const MIN_MAGNITUDE: f64 = 1.0;

/// Compute the similarity between `a` and `b` in `[0, 1]`.
///
/// If the vectors differ in length they are truncated to the shorter one
/// (a defensive fallback — callers such as the matcher are expected to only
/// compare vectors of equal length in the first place). Indices where both
/// values are exactly zero are skipped; if every index is skipped (e.g. both
/// inputs are all-zero), the result is `0.0` rather than dividing by a
/// zero count. Returns `0.0` if the (possibly truncated) length is below
/// `min_values`.
///
/// `similarity_factor` (k) scales the mean relative difference: higher k
/// makes the score fall off faster as vectors diverge.
pub fn similarity(a: &[f64], b: &[f64], similarity_factor: f64, min_values: usize) -> f64 {
    let len = a.len().min(b.len());
    if len < min_values.max(1) {
        return 0.0;
    }
    let a = &a[..len];
    let b = &b[..len];

    let mut total_diff = 0.0_f64;
    let mut count = 0usize;
    for i in 0..len {
        let (av, bv) = (a[i], b[i]);
        if av == 0.0 && bv == 0.0 {
            continue;
        }
        let denom = av.abs().max(bv.abs()).max(MIN_MAGNITUDE);
        total_diff += (av - bv).abs() / denom;
        count += 1;
    }

    if count == 0 {
        return 0.0;
    }
    let mean_diff = total_diff / count as f64;
    (1.0 - similarity_factor * mean_diff).max(0.0)
}

/// Compression error rate (CER) between a block `b` and its matched
/// template `t`, equal length assumed (the matcher never matches across
/// differing lengths). `epsilon` guards against division by zero templates.
pub fn cer(block: &[f64], template: &[f64]) -> f64 {
    const EPSILON: f64 = 1e-9;
    let len = block.len().min(template.len());
    if len == 0 {
        return 0.0;
    }
    let mut total = 0.0_f64;
    for i in 0..len {
        total += (block[i] - template[i]).abs() / template[i].abs().max(EPSILON);
    }
    total / len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_are_perfectly_similar() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(similarity(&v, &v, 20.0, 1), 1.0);
    }

    #[test]
    fn all_zero_vectors_are_not_divided_by_zero() {
        let v = [0.0, 0.0, 0.0];
        assert_eq!(similarity(&v, &v, 20.0, 1), 0.0);
    }

    #[test]
    fn truncates_to_shorter_length() {
        let a = [1.0, 1.0, 1.0];
        let b = [1.0, 1.0];
        // Should not panic, and should compare only the first two entries.
        assert_eq!(similarity(&a, &b, 20.0, 1), 1.0);
    }

    #[test]
    fn below_min_values_returns_zero() {
        let a = [1.0];
        let b = [1.0];
        assert_eq!(similarity(&a, &b, 20.0, 2), 0.0);
    }

    #[test]
    fn zero_similarity_factor_always_gives_one() {
        let a = [1.0, 50.0, -3.0];
        let b = [100.0, -50.0, 3.0];
        assert_eq!(similarity(&a, &b, 0.0, 1), 1.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.1, 1.9, 3.2];
        assert_eq!(similarity(&a, &b, 20.0, 1), similarity(&b, &a, 20.0, 1));
    }

    #[test]
    fn similarity_is_bounded() {
        let a = [1.0, 100.0, -40.0];
        let b = [-1.0, -100.0, 40.0];
        let s = similarity(&a, &b, 20.0, 1);
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn cer_of_identical_blocks_is_zero() {
        let v = [1.0, 2.0, 3.0];
        assert_eq!(cer(&v, &v), 0.0);
    }

    #[test]
    fn cer_is_nonnegative() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 1.0, 9.0];
        assert!(cer(&a, &b) >= 0.0);
    }
}
