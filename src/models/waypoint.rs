use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A geocoded stop derived from an activity's location text.
/// Built per map render and never persisted.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub display_name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

impl Waypoint {
    pub fn new(display_name: impl Into<String>, address: impl Into<String>, coords: LatLng) -> Self {
        Self {
            display_name: display_name.into(),
            address: address.into(),
            lat: coords.lat,
            lng: coords.lng,
        }
    }

    pub fn coords(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}
