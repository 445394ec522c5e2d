//! The ingest boundary's data shapes: a single timestamped scalar `Sample`,
//! and the heterogeneous `Reading` variant that upstream telemetry sources
//! actually hand over before it is projected down to `Sample`s.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// One timestamped scalar observation, as the engine core sees it.
///
/// `value` is guaranteed finite by construction: [`Sample::new`] rejects
/// NaN/±∞ at the boundary rather than letting them reach the template
/// store, where they would corrupt the similarity metric (division by a
/// non-finite magnitude is itself finite-valued but meaningless).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    value: f64,
}

impl Sample {
    /// Build a sample, returning `None` if `value` is not finite.
    ///
    /// This is the drop-at-the-boundary policy from the spec: non-finite
    /// readings never reach the engine.
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Option<Self> {
        if value.is_finite() {
            Some(Sample { timestamp, value })
        } else {
            None
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// The shape telemetry ingestion actually produces: either a single scalar
/// reading, or a multi-channel reading keyed by sensor name.
///
/// The engine core never sees this type directly; [`Reading::project`]
/// flattens it into per-channel scalar streams at the ingest boundary,
/// mirroring the original sort-keys-then-iterate projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Scalar {
        timestamp: DateTime<Utc>,
        value: f64,
    },
    Multi {
        timestamp: DateTime<Utc>,
        readings: BTreeMap<String, f64>,
    },
}

impl Reading {
    /// Flatten a batch of readings into independent per-channel scalar
    /// streams, keyed by channel name. `Scalar` readings all share the
    /// implicit channel name `"value"`. Non-finite values are dropped with
    /// a `tracing::warn!`, identified by their position in `batch`.
    pub fn project(batch: &[Reading]) -> BTreeMap<String, Vec<Sample>> {
        let mut out: BTreeMap<String, Vec<Sample>> = BTreeMap::new();
        for (idx, reading) in batch.iter().enumerate() {
            match reading {
                Reading::Scalar { timestamp, value } => {
                    match Sample::new(*timestamp, *value) {
                        Some(s) => out.entry("value".to_string()).or_default().push(s),
                        None => tracing::warn!(index = idx, value, "dropped non-finite scalar reading"),
                    }
                }
                Reading::Multi { timestamp, readings } => {
                    // BTreeMap iterates in sorted-key order already.
                    for (channel, value) in readings {
                        match Sample::new(*timestamp, *value) {
                            Some(s) => out.entry(channel.clone()).or_default().push(s),
                            None => tracing::warn!(
                                index = idx,
                                channel = channel.as_str(),
                                value,
                                "dropped non-finite multi reading"
                            ),
                        }
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(mins: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + mins * 60, 0).unwrap()
    }

    #[test]
    fn sample_rejects_non_finite() {
        assert!(Sample::new(ts(0), f64::NAN).is_none());
        assert!(Sample::new(ts(0), f64::INFINITY).is_none());
        assert!(Sample::new(ts(0), f64::NEG_INFINITY).is_none());
        assert!(Sample::new(ts(0), 1.0).is_some());
    }

    #[test]
    fn project_scalar_goes_to_value_channel() {
        let batch = vec![
            Reading::Scalar { timestamp: ts(0), value: 1.0 },
            Reading::Scalar { timestamp: ts(1), value: 2.0 },
        ];
        let projected = Reading::project(&batch);
        assert_eq!(projected.len(), 1);
        assert_eq!(projected["value"].len(), 2);
    }

    #[test]
    fn project_multi_splits_by_channel_in_sorted_order() {
        let mut readings = BTreeMap::new();
        readings.insert("temp".to_string(), 21.5);
        readings.insert("humidity".to_string(), 55.0);
        let batch = vec![Reading::Multi { timestamp: ts(0), readings }];
        let projected = Reading::project(&batch);
        assert_eq!(projected.len(), 2);
        assert!(projected.contains_key("temp"));
        assert!(projected.contains_key("humidity"));
    }

    #[test]
    fn project_drops_non_finite_and_keeps_others() {
        let mut readings = BTreeMap::new();
        readings.insert("a".to_string(), f64::NAN);
        readings.insert("b".to_string(), 3.0);
        let batch = vec![Reading::Multi { timestamp: ts(0), readings }];
        let projected = Reading::project(&batch);
        assert!(!projected.contains_key("a"));
        assert_eq!(projected["b"].len(), 1);
    }
}
