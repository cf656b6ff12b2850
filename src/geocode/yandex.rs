use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{Coordinates, GeocodingService};

const GEOCODER_URL: &str = "https://geocode-maps.yandex.ru/1.x/";

/// Yandex Geocoder HTTP API client, best match only.
pub struct YandexGeocoder {
    client: Client,
    apikey: String,
}

#[derive(Deserialize)]
struct Envelope {
    response: Response,
}

#[derive(Deserialize)]
struct Response {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember", default)]
    members: Vec<FeatureMember>,
}

#[derive(Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    geo_object: GeoObject,
}

#[derive(Deserialize)]
struct GeoObject {
    #[serde(rename = "Point")]
    point: Point,
}

#[derive(Deserialize)]
struct Point {
    pos: String,
}

/// `Point.pos` is a space-separated "longitude latitude" string.
fn parse_pos(pos: &str) -> Result<Coordinates> {
    let mut parts = pos.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(lon), Some(lat)) => Ok(Coordinates {
            lat: lat.parse().with_context(|| format!("latitude in `{pos}`"))?,
            lon: lon.parse().with_context(|| format!("longitude in `{pos}`"))?,
        }),
        _ => bail!("malformed Point.pos `{pos}`"),
    }
}

impl YandexGeocoder {
    pub fn new(client: Client, apikey: impl Into<String>) -> Self {
        Self {
            client,
            apikey: apikey.into(),
        }
    }
}

impl GeocodingService for YandexGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        let url = Url::parse_with_params(
            GEOCODER_URL,
            &[
                ("apikey", self.apikey.as_str()),
                ("geocode", query),
                ("format", "json"),
                ("results", "1"),
            ],
        )?;
        debug!(query = %query, "yandex geocode request");

        let envelope: Envelope = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("geocode request for `{query}` failed"))?
            .error_for_status()
            .context("geocoder returned non-success status")?
            .json()
            .await
            .context("decoding geocoder response")?;

        match envelope.response.collection.members.into_iter().next() {
            Some(member) => Ok(Some(parse_pos(&member.geo_object.point.pos)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_is_lon_then_lat() {
        let coords = parse_pos("37.618423 55.751244").unwrap();
        assert_eq!(coords.lat, 55.751244);
        assert_eq!(coords.lon, 37.618423);
    }

    #[test]
    fn malformed_pos_is_an_error() {
        assert!(parse_pos("37.618423").is_err());
        assert!(parse_pos("").is_err());
        assert!(parse_pos("east north").is_err());
    }

    #[test]
    fn decodes_envelope() {
        let body = r#"{
            "response": {
                "GeoObjectCollection": {
                    "featureMember": [
                        { "GeoObject": { "Point": { "pos": "37.6 55.7" } } }
                    ]
                }
            }
        }"#;
        let envelope: Envelope = serde_json::from_str(body).unwrap();
        let pos = &envelope.response.collection.members[0].geo_object.point.pos;
        assert_eq!(pos, "37.6 55.7");
    }

    #[test]
    fn empty_collection_decodes_to_no_members() {
        let body = r#"{ "response": { "GeoObjectCollection": {} } }"#;
        let envelope: Envelope = serde_json::from_str(body).unwrap();
        assert!(envelope.response.collection.members.is_empty());
    }
}
