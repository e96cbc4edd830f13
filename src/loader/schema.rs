// src/loader/schema.rs
use metrics::counter;
use serde::Deserialize;
use serde_json::{Number, Value};

use crate::errors::DecodeError;
use crate::metrics::RECORDS_SKIPPED;
use crate::record::{Coordinates, GeoRecord, RecordCollection};

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    // [lat, lon]; exactly two numbers, kept verbatim until range-checked
    coordinates: [Number; 2],
}

#[derive(Debug, Deserialize)]
struct Properties {
    datetime: String,
}

/// Decoded collection plus the number of features that were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeReport {
    pub collection: RecordCollection,
    pub skipped: usize,
}

/// Decode a location document: a bare array of features or a `FeatureCollection`.
///
/// Individual malformed features are skipped; the document only fails when its
/// shape is wrong or when none of a non-empty feature list is usable.
pub fn decode_document(text: &str) -> Result<DecodeReport, DecodeError> {
    let doc: Value = serde_json::from_str(text)?;
    let features = match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("features") {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(DecodeError::Schema("`features` is not an array".into())),
            None => {
                return Err(DecodeError::Schema(
                    "expected an array of features or a FeatureCollection".into(),
                ))
            }
        },
        other => {
            return Err(DecodeError::Schema(format!(
                "expected an array of features, found {}",
                json_kind(&other)
            )))
        }
    };

    let total = features.len();
    let mut records = Vec::with_capacity(total);
    for (idx, raw) in features.into_iter().enumerate() {
        match serde_json::from_value::<Feature>(raw) {
            Ok(f) => {
                let Some(coordinates) = finite_pair(&f.geometry.coordinates) else {
                    tracing::debug!(target: "loader", idx, "coordinates out of range, skipped");
                    continue;
                };
                records.push(GeoRecord::new(coordinates, f.properties.datetime));
            }
            Err(e) => {
                tracing::debug!(target: "loader", idx, error = %e, "malformed feature, skipped");
            }
        }
    }

    let skipped = total - records.len();
    if skipped > 0 {
        counter!(RECORDS_SKIPPED, "reason" => "feature").increment(skipped as u64);
        tracing::warn!(target: "loader", total, skipped, "some features could not be decoded");
    }
    if total > 0 && records.is_empty() {
        return Err(DecodeError::NoUsableRecords { total });
    }

    Ok(DecodeReport {
        collection: RecordCollection::new(records),
        skipped,
    })
}

/// `None` when either number does not fit a finite `f64` (e.g. `1e400`).
fn finite_pair([lat, lon]: &[Number; 2]) -> Option<Coordinates> {
    let c = Coordinates::new(lat.as_f64()?, lon.as_f64()?);
    c.is_finite().then_some(c)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
