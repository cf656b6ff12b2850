use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{Coordinates, GeocodingService};

const SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// OSM Nominatim search client, best match only.
///
/// Nominatim's usage policy requires an identifying User-Agent and at most
/// one request in flight; the shared `Client` carries the agent string and
/// the pipeline's sequential loop provides the pacing.
pub struct NominatimGeocoder {
    client: Client,
}

#[derive(Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl GeocodingService for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        let url = Url::parse_with_params(
            SEARCH_URL,
            &[("q", query), ("format", "jsonv2"), ("limit", "1")],
        )?;
        debug!(query = %query, "nominatim search request");

        let results: Vec<SearchResult> = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("search request for `{query}` failed"))?
            .error_for_status()
            .context("nominatim returned non-success status")?
            .json()
            .await
            .context("decoding nominatim response")?;

        match results.into_iter().next() {
            Some(first) => Ok(Some(Coordinates {
                lat: first.lat.parse().context("latitude field")?,
                lon: first.lon.parse().context("longitude field")?,
            })),
            None => Ok(None),
        }
    }
}
