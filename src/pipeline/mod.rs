use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::aggregate::Location;
use crate::geocode::cache::GeocodeCache;
use crate::geocode::resolver::{GeocodeResolver, Resolution};
use crate::geocode::{Coordinates, GeocodingService};

/// The whole pass produced nothing displayable.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("no location could be resolved to coordinates")]
    NoResults,
}

/// A location with its resolved coordinates, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub location: Location,
    pub coordinates: Coordinates,
}

/// Observational progress updates; consumers may drop them freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Geocoding { current: usize, total: usize },
}

/// Drives the resolver over an aggregated location list, in order.
pub struct LocationResolutionPipeline<G> {
    resolver: GeocodeResolver<G>,
    progress: Option<UnboundedSender<ProgressEvent>>,
}

impl<G: GeocodingService> LocationResolutionPipeline<G> {
    pub fn new(service: G) -> Self {
        Self {
            resolver: GeocodeResolver::new(service),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: UnboundedSender<ProgressEvent>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Resolves every location, one lookup in flight at a time.
    ///
    /// The strictly sequential await is the rate policy toward the geocoding
    /// service, not an implementation convenience; do not parallelize it
    /// without adding real throttling and locking the cache.
    ///
    /// Unresolvable locations are logged and dropped; output preserves input
    /// order. A pass in which nothing resolves is `PipelineError::NoResults`.
    pub async fn resolve_all(
        &self,
        cache: &mut GeocodeCache,
        locations: Vec<Location>,
    ) -> Result<Vec<ResolvedLocation>, PipelineError> {
        let total = locations.len();
        let mut resolved = Vec::with_capacity(total);

        for (i, mut location) in locations.into_iter().enumerate() {
            self.report(ProgressEvent::Geocoding {
                current: i + 1,
                total,
            });

            match self.resolver.resolve(cache, &location.address).await {
                Resolution::Exact(coordinates) => resolved.push(ResolvedLocation {
                    location,
                    coordinates,
                }),
                Resolution::Approximate(coordinates) => {
                    location.mark_approximate();
                    resolved.push(ResolvedLocation {
                        location,
                        coordinates,
                    });
                }
                Resolution::Unresolved => {
                    warn!(address = %location.address, "address could not be geocoded, dropped");
                }
            }
        }

        if resolved.is_empty() {
            return Err(PipelineError::NoResults);
        }
        Ok(resolved)
    }

    fn report(&self, event: ProgressEvent) {
        if let Some(progress) = &self.progress {
            // A closed receiver only means nobody is watching.
            let _ = progress.send(event);
        }
    }
}
