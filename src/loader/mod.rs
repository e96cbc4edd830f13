// src/loader/mod.rs
//! Data acquisition: the default document at startup, or a file the user imports.
//! Neither path retries; the caller decides what to show on failure.

pub mod schema;
pub mod sources;

use metrics::counter;

use crate::errors::{ImportError, LoadError};
use crate::metrics::{ensure_described, IMPORT_FAILURES, LOAD_FAILURES, RECORDS_LOADED};
use crate::record::RecordCollection;
use schema::decode_document;
use sources::DataSource;

const JSON_CONTENT_TYPES: &[&str] = &["application/json", "application/geo+json", "text/json"];

/// A user-selected file as it crosses the import boundary.
#[derive(Debug, Clone, Default)]
pub struct ImportFile {
    pub name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImportFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: Some(name.into()),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// JSON by extension or by declared content type (parameters like `charset` ignored).
    pub fn looks_like_json(&self) -> bool {
        let by_name = self
            .name
            .as_deref()
            .map(|n| n.trim().to_ascii_lowercase().ends_with(".json"))
            .unwrap_or(false);
        let by_type = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| {
                let ct = ct.trim().to_ascii_lowercase();
                JSON_CONTENT_TYPES.contains(&ct.as_str())
            })
            .unwrap_or(false);
        by_name || by_type
    }
}

/// Fetch and decode the default document.
pub async fn load(source: &dyn DataSource) -> Result<RecordCollection, LoadError> {
    ensure_described();
    let location = source.location();

    let result = async {
        let bytes = source.fetch().await?;
        let text = std::str::from_utf8(&bytes).map_err(LoadError::Encoding)?;
        Ok::<_, LoadError>(decode_document(text)?)
    }
    .await;

    match result {
        Ok(report) => {
            counter!(RECORDS_LOADED).increment(report.collection.len() as u64);
            tracing::info!(
                target: "loader",
                %location,
                records = report.collection.len(),
                skipped = report.skipped,
                "default data loaded"
            );
            Ok(report.collection)
        }
        Err(e) => {
            counter!(LOAD_FAILURES).increment(1);
            tracing::warn!(target: "loader", %location, error = %e, "default data unavailable");
            Err(e)
        }
    }
}

/// Validate and decode an imported file. Does not touch any existing collection.
pub fn import_file(file: &ImportFile) -> Result<RecordCollection, ImportError> {
    ensure_described();

    let result = (|| -> Result<_, ImportError> {
        if !file.looks_like_json() {
            let what = file
                .name
                .clone()
                .or_else(|| file.content_type.clone())
                .unwrap_or_else(|| "unnamed file".to_string());
            return Err(ImportError::UnsupportedType(what));
        }
        let text = std::str::from_utf8(&file.bytes).map_err(ImportError::Encoding)?;
        Ok(decode_document(text)?)
    })();

    match result {
        Ok(report) => {
            counter!(RECORDS_LOADED).increment(report.collection.len() as u64);
            tracing::info!(
                target: "loader",
                file = file.name.as_deref().unwrap_or("-"),
                records = report.collection.len(),
                skipped = report.skipped,
                "import decoded"
            );
            Ok(report.collection)
        }
        Err(e) => {
            counter!(IMPORT_FAILURES).increment(1);
            tracing::warn!(target: "loader", file = file.name.as_deref().unwrap_or("-"), error = %e, "import rejected");
            Err(e)
        }
    }
}
