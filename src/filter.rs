//! # Temporal Filter
//! Pure mapping `(collection, range) → FilteredView`. No I/O beyond a debug
//! log line and a skip counter; never mutates its input.
//!
//! Policy: with a range, a record is kept iff `from < t < to`. Both bounds are
//! exclusive, so a record stamped exactly at `from` or `to` is dropped. A range
//! with `from > to` matches nothing.

use chrono::{NaiveDate, NaiveDateTime};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::metrics::RECORDS_SKIPPED;
use crate::record::{Coordinates, GeoRecord, RecordCollection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl DateRange {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self { from, to }
    }

    /// Range picked on a calendar: both days map to their midnight.
    pub fn from_days(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: from.and_time(chrono::NaiveTime::MIN),
            to: to.and_time(chrono::NaiveTime::MIN),
        }
    }

    pub fn is_inverted(&self) -> bool {
        self.from > self.to
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.from < t && t < self.to
    }
}

/// Derived subset of the collection for the active range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteredView {
    pub records: Vec<GeoRecord>,
    pub coordinates: Vec<Coordinates>,
    /// Records left out because their timestamp did not parse.
    pub skipped: usize,
}

impl FilteredView {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

pub fn filter(collection: &RecordCollection, range: Option<&DateRange>) -> FilteredView {
    let Some(range) = range else {
        let records = collection.to_vec();
        let coordinates = records.iter().map(|r| r.coordinates).collect();
        return FilteredView {
            records,
            coordinates,
            skipped: 0,
        };
    };

    if range.is_inverted() {
        tracing::debug!(target: "filter", from = %range.from, to = %range.to, "inverted range, nothing matches");
        return FilteredView::default();
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for r in collection.iter() {
        match r.instant() {
            Some(t) if range.contains(t) => records.push(r.clone()),
            Some(_) => {}
            None => {
                skipped += 1;
                tracing::debug!(target: "filter", key = %r.key, timestamp = %r.timestamp, "unparseable timestamp, skipped");
            }
        }
    }

    if skipped > 0 {
        counter!(RECORDS_SKIPPED, "reason" => "timestamp").increment(skipped as u64);
    }

    let coordinates = records.iter().map(|r| r.coordinates).collect();
    FilteredView {
        records,
        coordinates,
        skipped,
    }
}
