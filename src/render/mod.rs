pub mod geojson;

use std::fmt::Write as _;

use crate::geocode::Coordinates;
use crate::pipeline::ResolvedLocation;

/// One map marker: popup title, popup body, and where it sits.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub title: String,
    pub body: String,
    pub coordinates: Coordinates,
}

/// Capability interface over a concrete map output surface.
pub trait MapRenderer {
    fn render(&mut self, markers: &[Marker]) -> anyhow::Result<()>;
}

/// Builds the display marker for one resolved location.
///
/// The title carries the reference number and address; the body lists each
/// role with its required headcount and pay rate, one block per role.
pub fn marker_for(resolved: &ResolvedLocation) -> Marker {
    let location = &resolved.location;
    let number = location
        .roles
        .first()
        .map_or(0, |role| role.reference_number);

    let mut body = String::new();
    for role in &location.roles {
        if !body.is_empty() {
            body.push('\n');
        }
        let _ = write!(
            body,
            "{}\nТребуется сотрудников: {}\nТариф: {} руб.",
            role.role, role.count, role.pay_rate
        );
    }

    Marker {
        title: format!("ТК {} {}", number, location.address),
        body,
        coordinates: resolved.coordinates,
    }
}

pub fn markers_for(resolved: &[ResolvedLocation]) -> Vec<Marker> {
    resolved.iter().map(marker_for).collect()
}

/// South-west / north-east envelope of a marker set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl Bounds {
    pub fn center(&self) -> Coordinates {
        Coordinates {
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
            lon: (self.south_west.lon + self.north_east.lon) / 2.0,
        }
    }
}

/// Viewport-fitting envelope for all markers; `None` when there are none.
pub fn bounds(markers: &[Marker]) -> Option<Bounds> {
    let first = markers.first()?.coordinates;
    let mut south_west = first;
    let mut north_east = first;

    for marker in &markers[1..] {
        let c = marker.coordinates;
        south_west.lat = south_west.lat.min(c.lat);
        south_west.lon = south_west.lon.min(c.lon);
        north_east.lat = north_east.lat.max(c.lat);
        north_east.lon = north_east.lon.max(c.lon);
    }

    Some(Bounds {
        south_west,
        north_east,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{Location, RoleDemand};

    fn resolved() -> ResolvedLocation {
        ResolvedLocation {
            location: Location {
                address: "Тестовая ул, 5".to_string(),
                roles: vec![
                    RoleDemand {
                        role: "Грузчик".to_string(),
                        count: 5,
                        pay_rate: 2000,
                        reference_number: 1,
                    },
                    RoleDemand {
                        role: "Кассир".to_string(),
                        count: 2,
                        pay_rate: 1800,
                        reference_number: 1,
                    },
                ],
            },
            coordinates: Coordinates {
                lat: 55.7,
                lon: 37.6,
            },
        }
    }

    #[test]
    fn marker_title_and_body() {
        let marker = marker_for(&resolved());
        assert_eq!(marker.title, "ТК 1 Тестовая ул, 5");
        assert_eq!(
            marker.body,
            "Грузчик\nТребуется сотрудников: 5\nТариф: 2000 руб.\n\
             Кассир\nТребуется сотрудников: 2\nТариф: 1800 руб."
        );
        assert_eq!(
            marker.coordinates,
            Coordinates {
                lat: 55.7,
                lon: 37.6
            }
        );
    }

    #[test]
    fn bounds_envelope_and_center() {
        let mut a = marker_for(&resolved());
        let mut b = a.clone();
        a.coordinates = Coordinates {
            lat: 55.0,
            lon: 38.0,
        };
        b.coordinates = Coordinates {
            lat: 56.0,
            lon: 37.0,
        };

        let bounds = bounds(&[a, b]).unwrap();
        assert_eq!(
            bounds.south_west,
            Coordinates {
                lat: 55.0,
                lon: 37.0
            }
        );
        assert_eq!(
            bounds.north_east,
            Coordinates {
                lat: 56.0,
                lon: 38.0
            }
        );
        assert_eq!(
            bounds.center(),
            Coordinates {
                lat: 55.5,
                lon: 37.5
            }
        );
    }

    #[test]
    fn no_markers_no_bounds() {
        assert_eq!(bounds(&[]), None);
    }
}
