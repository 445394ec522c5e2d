//! Wire-only helpers: a finite-or-null numeric wrapper and a
//! second-precision ISO-8601 instant wrapper, used exclusively by
//! [`crate::record`]'s wire structs. The engine's own arithmetic never
//! produces non-finite values from finite inputs, so nothing outside the
//! codec boundary needs to know about this representation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A numeric value that serializes as `null` when non-finite and decodes
/// `null` back to `f64::NAN` — a sentinel the consumer can test for with
/// `.is_nan()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteOr(pub f64);

impl From<f64> for FiniteOr {
    fn from(v: f64) -> Self {
        FiniteOr(v)
    }
}

impl From<FiniteOr> for f64 {
    fn from(v: FiniteOr) -> Self {
        v.0
    }
}

impl Serialize for FiniteOr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.serialize_none()
        }
    }
}

impl<'de> Deserialize<'de> for FiniteOr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let opt = Option::<f64>::deserialize(deserializer)?;
        match opt {
            Some(v) => Ok(FiniteOr(v)),
            None => Ok(FiniteOr(f64::NAN)),
        }
    }
}

/// An instant serialized with second precision ISO-8601
/// (`2024-01-01T00:00:00Z`), per the record codec's byte-compatibility
/// requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstantSeconds(pub DateTime<Utc>);

impl Serialize for InstantSeconds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl<'de> Deserialize<'de> for InstantSeconds {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let dt = DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DeError::custom(format!("bad instant {raw:?}: {e}")))?;
        Ok(InstantSeconds(dt))
    }
}
