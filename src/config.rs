use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

/// Which geocoding vendor backs the resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocoderProvider {
    Yandex,
    Nominatim,
    /// Answers every query with the configured default center; offline runs.
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub provider: GeocoderProvider,
    /// Required by the yandex provider, unused by the others.
    pub apikey: String,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            provider: GeocoderProvider::Nominatim,
            apikey: String::new(),
        }
    }
}

/// Runtime configuration, deserialized from a YAML file. Every field has a
/// default so partial files work.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub google_api_key: String,
    pub geocoder: GeocoderConfig,
    /// Map center when nothing else determines one, `[lat, lon]`.
    pub default_center: [f64; 2],
    /// Where the rendered marker file is written.
    pub output: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: "18CV2mGHXk28i6YrXK5R1CaH3BaQHOA45qwi1r07NkzI".to_string(),
            sheet_name: "Потребность готовый".to_string(),
            google_api_key: String::new(),
            geocoder: GeocoderConfig::default(),
            default_center: [55.751244, 37.618423],
            output: PathBuf::from("markers.geojson"),
        }
    }
}

impl AppConfig {
    /// Loads YAML config from `path`; a missing file falls back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}
