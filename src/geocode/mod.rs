pub mod cache;
pub mod mock;
pub mod nominatim;
pub mod resolver;
pub mod yandex;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A WGS84 latitude/longitude pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Capability interface over a concrete geocoding vendor.
///
/// Implementations return at most one best-match coordinate for a free-text
/// query and must tolerate arbitrary Unicode address text. Transport and
/// payload errors surface as `Err`; a well-formed "no such place" answer is
/// `Ok(None)`. The resolver treats both the same way, so implementations
/// should not retry internally.
#[allow(async_fn_in_trait)]
pub trait GeocodingService {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>>;
}

/// Runtime-selected vendor, one variant per configured provider.
pub enum AnyGeocoder {
    Yandex(yandex::YandexGeocoder),
    Nominatim(nominatim::NominatimGeocoder),
    Mock(mock::MockGeocoder),
}

impl GeocodingService for AnyGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        match self {
            AnyGeocoder::Yandex(g) => g.geocode(query).await,
            AnyGeocoder::Nominatim(g) => g.geocode(query).await,
            AnyGeocoder::Mock(g) => g.geocode(query).await,
        }
    }
}
