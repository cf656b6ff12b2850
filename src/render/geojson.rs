use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use super::{bounds, MapRenderer, Marker};
use crate::geocode::Coordinates;

/// Writes markers as a GeoJSON `FeatureCollection`.
///
/// The `bbox` member carries the viewport-fitting envelope; `metadata` is a
/// foreign member with the generation timestamp and a map center (bounds
/// midpoint, or the configured default when there are no markers).
pub struct GeoJsonRenderer {
    path: PathBuf,
    default_center: Coordinates,
}

#[derive(Serialize)]
struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bbox: Option<[f64; 4]>,
    metadata: Metadata,
    features: Vec<Feature<'a>>,
}

#[derive(Serialize)]
struct Metadata {
    generated_at: String,
    center: Coordinates,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    geometry: Geometry,
    properties: Properties<'a>,
}

#[derive(Serialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: &'static str,
    /// GeoJSON position order: longitude first.
    coordinates: [f64; 2],
}

#[derive(Serialize)]
struct Properties<'a> {
    title: &'a str,
    description: &'a str,
}

impl GeoJsonRenderer {
    pub fn new(path: impl Into<PathBuf>, default_center: Coordinates) -> Self {
        Self {
            path: path.into(),
            default_center,
        }
    }
}

impl MapRenderer for GeoJsonRenderer {
    fn render(&mut self, markers: &[Marker]) -> Result<()> {
        let envelope = bounds(markers);
        let collection = FeatureCollection {
            kind: "FeatureCollection",
            bbox: envelope.map(|b| {
                [
                    b.south_west.lon,
                    b.south_west.lat,
                    b.north_east.lon,
                    b.north_east.lat,
                ]
            }),
            metadata: Metadata {
                generated_at: Utc::now().to_rfc3339(),
                center: envelope.map_or(self.default_center, |b| b.center()),
            },
            features: markers
                .iter()
                .map(|marker| Feature {
                    kind: "Feature",
                    geometry: Geometry {
                        kind: "Point",
                        coordinates: [marker.coordinates.lon, marker.coordinates.lat],
                    },
                    properties: Properties {
                        title: &marker.title,
                        description: &marker.body,
                    },
                })
                .collect(),
        };

        let json = serde_json::to_string_pretty(&collection).context("serializing GeoJSON")?;

        // Write-then-rename so a crash never leaves a truncated file behind.
        let tmp_path = self.path.with_extension("geojson.tmp");
        fs::write(&tmp_path, json)
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("renaming {} into place", tmp_path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    fn marker(title: &str, lat: f64, lon: f64) -> Marker {
        Marker {
            title: title.to_string(),
            body: format!("{title} body"),
            coordinates: Coordinates { lat, lon },
        }
    }

    #[test]
    fn writes_a_feature_collection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("markers.geojson");
        let center = Coordinates {
            lat: 55.751244,
            lon: 37.618423,
        };

        let markers = vec![
            marker("ТК 1 Тестовая ул, 5", 55.0, 37.0),
            marker("ТК 2 Другая ул, 7", 56.0, 38.0),
        ];
        let mut renderer = GeoJsonRenderer::new(&path, center);
        renderer.render(&markers).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["type"], "FeatureCollection");
        assert_eq!(written["features"].as_array().unwrap().len(), 2);
        assert_eq!(
            written["features"][0]["geometry"]["coordinates"],
            serde_json::json!([37.0, 55.0])
        );
        assert_eq!(
            written["features"][0]["properties"]["title"],
            "ТК 1 Тестовая ул, 5"
        );
        assert_eq!(written["bbox"], serde_json::json!([37.0, 55.0, 38.0, 56.0]));
        assert_eq!(written["metadata"]["center"]["lat"], 55.5);
    }

    #[test]
    fn empty_marker_set_uses_default_center_and_no_bbox() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("markers.geojson");
        let center = Coordinates {
            lat: 55.751244,
            lon: 37.618423,
        };

        let mut renderer = GeoJsonRenderer::new(&path, center);
        renderer.render(&[]).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written.get("bbox").is_none());
        assert_eq!(written["metadata"]["center"]["lat"], 55.751244);
        assert!(written["features"].as_array().unwrap().is_empty());
    }

    #[test]
    fn rerender_replaces_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("markers.geojson");
        let center = Coordinates { lat: 0.0, lon: 0.0 };

        let mut renderer = GeoJsonRenderer::new(&path, center);
        renderer.render(&[marker("a", 1.0, 2.0)]).unwrap();
        renderer.render(&[marker("b", 3.0, 4.0)]).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let features = written["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["title"], "b");
    }
}
