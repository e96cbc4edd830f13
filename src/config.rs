// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::map::HeatmapOptions;
use crate::record::Coordinates;

pub const ENV_CONFIG_PATH: &str = "GEOTRACE_CONFIG";
pub const ENV_DATA: &str = "GEOTRACE_DATA";
pub const ENV_BIND: &str = "GEOTRACE_BIND";
pub const ENV_GEOCODER: &str = "GEOTRACE_GEOCODER";
pub const DEFAULT_CONFIG_PATH: &str = "config/geotrace.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub map: MapConfig,
    pub geocoder: GeocoderConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// File path or http(s) URL of the default location document.
    pub default_source: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            default_source: "data/Geo.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center: Coordinates,
    pub zoom: u8,
    pub markers_shown: bool,
    pub heatmap: HeatmapOptions,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            // London
            center: Coordinates::new(51.509865, -0.118092),
            zoom: 13,
            markers_shown: false,
            heatmap: HeatmapOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub user_agent: String,
    /// Minimum spacing between upstream requests.
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
    /// Nominatim detail level; 10 is city.
    pub zoom: u8,
    pub cache_capacity: usize,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("geotrace/", env!("CARGO_PKG_VERSION")).to_string(),
            min_interval_ms: 1_000,
            timeout_secs: 10,
            zoom: 10,
            cache_capacity: 4_096,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from an explicit TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $GEOTRACE_CONFIG (must exist)
    /// 2) config/geotrace.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if p.exists() {
                Self::load_from(&p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var(ENV_DATA) {
            if !v.trim().is_empty() {
                self.data.default_source = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var(ENV_BIND) {
            if !v.trim().is_empty() {
                self.server.bind = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var(ENV_GEOCODER) {
            self.geocoder.enabled = !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "off" | "0" | "false" | "no"
            );
        }
    }
}
