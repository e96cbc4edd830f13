// Error types for geotrace

use std::{io, path::PathBuf, str::Utf8Error};
use thiserror::Error;

/// Structural failure while decoding a location document.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected document shape: {0}")]
    Schema(String),
    #[error("none of the {total} features could be decoded")]
    NoUsableRecords { total: usize },
}

/// The default data source could not be loaded. Recovered by asking for a manual import.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("fetching {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("fetching {url}: HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("{location} is unavailable: {reason}")]
    Unavailable { location: String, reason: String },
    #[error("default data is not UTF-8")]
    Encoding(#[source] Utf8Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A user-supplied file was rejected. The previously loaded data stays in place.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("file is not UTF-8 text")]
    Encoding(#[source] Utf8Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Reverse geocoding did not produce a place. Never shown to the end user.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("reverse geocoding is disabled")]
    Disabled,
    #[error("reverse geocoding request failed")]
    Http(#[from] reqwest::Error),
    #[error("reverse geocoding returned HTTP {0}")]
    Status(u16),
    #[error("no place found at this location")]
    NotFound,
}
