//! # Records
//! One timestamped coordinate observation per photo, plus the immutable
//! collection they are loaded into.
//!
//! Timestamps arrive as text in the fixed `yyyy-MM-dd HH:mm:ss` format (naive
//! local time) and are parsed once, when the record is built.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format of `properties.datetime` in the location document.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a timestamp in [`TIMESTAMP_FORMAT`]. Returns `None` instead of an error;
/// callers count the skip.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

/// A `(lat, lon)` pair. Serialized as `[lat, lon]`, the order the map surface uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

impl From<[f64; 2]> for Coordinates {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(c: Coordinates) -> Self {
        [c.lat, c.lon]
    }
}

/// Stable identity of a record: a short digest of its coordinates and timestamp.
///
/// Two records with identical coordinates and timestamp share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    fn derive(coordinates: Coordinates, timestamp: &str) -> Self {
        use sha2::{Digest, Sha256};
        use std::fmt::Write as _;

        let mut hasher = Sha256::new();
        hasher.update(coordinates.lat.to_bits().to_be_bytes());
        hasher.update(coordinates.lon.to_bits().to_be_bytes());
        hasher.update(timestamp.as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(12);
        for b in digest.iter().take(6) {
            let _ = write!(&mut out, "{:02x}", b);
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One geotagged observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoRecord {
    pub key: RecordKey,
    pub coordinates: Coordinates,
    pub timestamp: String,
    #[serde(skip)]
    instant: Option<NaiveDateTime>,
}

impl GeoRecord {
    pub fn new(coordinates: Coordinates, timestamp: impl Into<String>) -> Self {
        let timestamp = timestamp.into();
        Self {
            key: RecordKey::derive(coordinates, &timestamp),
            instant: parse_timestamp(&timestamp),
            coordinates,
            timestamp,
        }
    }

    /// Parsed timestamp; `None` when the text does not match [`TIMESTAMP_FORMAT`].
    pub fn instant(&self) -> Option<NaiveDateTime> {
        self.instant
    }
}

/// Records in source order. Cheap to clone; never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCollection(Arc<[GeoRecord]>);

impl RecordCollection {
    pub fn new(records: Vec<GeoRecord>) -> Self {
        Self(Arc::from(records))
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// True when both handles point at the same loaded snapshot.
    pub fn same_snapshot(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for RecordCollection {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for RecordCollection {
    type Target = [GeoRecord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<GeoRecord> for RecordCollection {
    fn from_iter<I: IntoIterator<Item = GeoRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
