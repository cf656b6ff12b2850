use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Result};

use super::{Coordinates, GeocodingService};

/// Scripted in-memory geocoder.
///
/// Answers only the queries it was seeded with and counts every call, which
/// makes cache behavior observable in tests. `fixed` mode answers every
/// query with one coordinate and backs the `mock` provider for offline runs.
#[derive(Debug, Default)]
pub struct MockGeocoder {
    answers: HashMap<String, Coordinates>,
    fixed: Option<Coordinates>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every query with `coords`.
    pub fn fixed(coords: Coordinates) -> Self {
        Self {
            fixed: Some(coords),
            ..Self::default()
        }
    }

    /// Seeds one scripted answer.
    pub fn with_answer(mut self, query: impl Into<String>, coords: Coordinates) -> Self {
        self.answers.insert(query.into(), coords);
        self
    }

    /// Makes every call return a transport-style error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GeocodingService for MockGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinates>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("scripted geocoder failure");
        }
        if let Some(coords) = self.fixed {
            return Ok(Some(coords));
        }
        Ok(self.answers.get(query).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_answers_and_call_count() {
        let geocoder = MockGeocoder::new().with_answer("known", Coordinates { lat: 1.0, lon: 2.0 });

        assert_eq!(
            geocoder.geocode("known").await.unwrap(),
            Some(Coordinates { lat: 1.0, lon: 2.0 })
        );
        assert_eq!(geocoder.geocode("unknown").await.unwrap(), None);
        assert_eq!(geocoder.calls(), 2);
    }

    #[tokio::test]
    async fn fixed_mode_answers_everything() {
        let center = Coordinates {
            lat: 55.751244,
            lon: 37.618423,
        };
        let geocoder = MockGeocoder::fixed(center);
        assert_eq!(geocoder.geocode("anything at all").await.unwrap(), Some(center));
    }
}
