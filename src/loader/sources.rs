// src/loader/sources.rs
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::LoadError;

/// Somewhere the default location document can be read from.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, LoadError>;
    /// Human-readable location for logs and status.
    fn location(&self) -> String;
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| LoadError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl DataSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| LoadError::Http {
                url: self.url.clone(),
                source,
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await.map_err(|source| LoadError::Http {
            url: self.url.clone(),
            source,
        })?;
        Ok(body.to_vec())
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}

/// In-memory document, for tests and embedding.
pub struct StaticSource {
    name: String,
    body: Vec<u8>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

#[async_trait]
impl DataSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        Ok(self.body.clone())
    }

    fn location(&self) -> String {
        self.name.clone()
    }
}

/// A source that could not be set up. Every fetch reports why.
pub struct UnavailableSource {
    location: String,
    reason: String,
}

impl UnavailableSource {
    pub fn new(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl DataSource for UnavailableSource {
    async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        Err(LoadError::Unavailable {
            location: self.location.clone(),
            reason: self.reason.clone(),
        })
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}

/// `http://` / `https://` locations are fetched, anything else is a file path.
pub fn source_for(location: &str) -> Box<dyn DataSource> {
    let location = location.trim();
    let lower = location.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Box::new(FileSource::new(location));
    }
    match HttpSource::new(location) {
        Ok(src) => Box::new(src),
        Err(e) => {
            tracing::error!(target: "loader", %location, error = %e, "could not build HTTP client");
            Box::new(UnavailableSource::new(location, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_picks_transport() {
        assert_eq!(
            source_for("https://example.test/Geo.json").location(),
            "https://example.test/Geo.json"
        );
        assert_eq!(source_for(" data/Geo.json ").location(), "data/Geo.json");
    }

    #[tokio::test]
    async fn unavailable_source_reports_reason() {
        let src = UnavailableSource::new("https://example.test/Geo.json", "no TLS backend");
        match src.fetch().await {
            Err(LoadError::Unavailable { location, reason }) => {
                assert_eq!(location, "https://example.test/Geo.json");
                assert_eq!(reason, "no TLS backend");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn http_source_keeps_configured_client() {
        let src = HttpSource::new("http://localhost/Geo.json").unwrap();
        assert_eq!(src.location(), "http://localhost/Geo.json");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = FileSource::new(dir.path().join("nope.json"));
        assert!(matches!(src.fetch().await, Err(LoadError::Io { .. })));
    }
}
