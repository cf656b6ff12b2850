use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use super::cache::GeocodeCache;
use super::{Coordinates, GeocodingService};

/// Matches the start of a house-number segment: a comma followed by a digit,
/// e.g. the ", 34" in "Ленинский проспект, 34, Москва".
static HOUSE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*\d").unwrap());

/// Derives the street-only fallback query by truncating the address before
/// its first house-number segment. Returns `None` when the address has no
/// such segment or nothing would remain of it.
pub fn street_only_query(address: &str) -> Option<String> {
    let m = HOUSE_NUMBER.find(address)?;
    let street = address[..m.start()].trim();
    if street.is_empty() {
        return None;
    }
    Some(street.to_string())
}

/// Terminal outcome of resolving one address.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// The full address matched.
    Exact(Coordinates),
    /// Only the street-only fallback query matched; callers should annotate
    /// the address as approximate.
    Approximate(Coordinates),
    /// Neither query matched.
    Unresolved,
}

/// Resolves one address to coordinates through the service, cache first.
///
/// Every query string is memoized exactly once, hits and misses alike, so
/// re-resolving a previously attempted address issues zero external calls
/// and reproduces the earlier outcome. Service errors are demoted to misses;
/// an unreliable geocoder degrades the result set, never the run.
pub struct GeocodeResolver<G> {
    service: G,
}

impl<G: GeocodingService> GeocodeResolver<G> {
    pub fn new(service: G) -> Self {
        Self { service }
    }

    pub async fn resolve(&self, cache: &mut GeocodeCache, address: &str) -> Resolution {
        if let Some(coords) = self.lookup(cache, address).await {
            return Resolution::Exact(coords);
        }
        let Some(street) = street_only_query(address) else {
            return Resolution::Unresolved;
        };
        debug!(address = %address, fallback = %street, "exact lookup failed, trying street-only query");
        match self.lookup(cache, &street).await {
            Some(coords) => Resolution::Approximate(coords),
            None => Resolution::Unresolved,
        }
    }

    /// One memoized query: a cached entry (either outcome) short-circuits the
    /// network, otherwise exactly one service call is made and its outcome
    /// cached.
    async fn lookup(&self, cache: &mut GeocodeCache, query: &str) -> Option<Coordinates> {
        if let Some(cached) = cache.get(query) {
            return cached;
        }
        let outcome = match self.service.geocode(query).await {
            Ok(found) => found,
            Err(error) => {
                warn!(query = %query, error = %error, "geocoding call failed");
                None
            }
        };
        cache.put(query, outcome);
        outcome
    }
}
