//! Geocoding Service with Google Maps API Integration
//!
//! Converts activity addresses into coordinates for map display and asks the
//! Directions API for an optimised waypoint order.
//!
//! ## Setup
//! 1. Get a Google Maps API key from Google Cloud Console
//! 2. Enable the Geocoding API and Directions API
//! 3. Set the environment variable: `GOOGLE_MAPS_API_KEY=your_api_key_here`
//!
//! ## Degradation
//! Without a key (or when a lookup fails) addresses get synthetic coordinates
//! stepped away from central Seoul, so the map still renders. Batches are
//! geocoded one address at a time with a fixed pause between requests to stay
//! under the provider's rate limit.

use std::time::Duration;

use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::MapsConfig;
use crate::models::waypoint::{LatLng, Waypoint};

/// Reference point for synthetic coordinates (Seoul City Hall).
pub const FALLBACK_ORIGIN: LatLng = LatLng {
    lat: 37.5665,
    lng: 126.9780,
};
const FALLBACK_STEP_DEGREES: f64 = 0.01;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: Option<String>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    waypoint_order: Vec<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum MapsError {
    #[error("Google Maps API key is not configured")]
    Unavailable,
    #[error("Google Maps request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Google Maps API error: {status} {message}")]
    Api { status: String, message: String },
    #[error("Google Maps returned an unusable route: {0}")]
    InvalidRoute(String),
}

/// Outcome of geocoding a batch of addresses.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeBatch {
    pub waypoints: Vec<Waypoint>,
    pub fallback_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Synthetic coordinates for the `index`-th waypoint of a batch.
pub fn fallback_coordinates(index: usize) -> LatLng {
    let offset = index as f64 * FALLBACK_STEP_DEGREES;
    LatLng::new(FALLBACK_ORIGIN.lat + offset, FALLBACK_ORIGIN.lng + offset)
}

#[derive(Clone)]
pub struct GeocodingService {
    http_client: Client,
    api_key: Option<String>,
    base_url: String,
    request_delay: Duration,
}

impl GeocodingService {
    pub fn new(config: &MapsConfig) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_delay: config.geocode_delay,
        })
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Look up one address. `Ok(None)` means the service found nothing.
    pub async fn geocode(&self, address: &str) -> Result<Option<LatLng>, MapsError> {
        let api_key = self.api_key.as_deref().ok_or(MapsError::Unavailable)?;
        let url = format!("{}/maps/api/geocode/json", self.base_url);

        let response: GeocodeResponse = self
            .http_client
            .get(&url)
            .query(&[("address", address), ("key", api_key)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match response.status.as_str() {
            "OK" => Ok(response.results.into_iter().next().map(|r| {
                if let Some(formatted) = r.formatted_address {
                    info!("Geocoded '{}' as '{}'", address, formatted);
                }
                r.geometry.location
            })),
            "ZERO_RESULTS" => Ok(None),
            _ => Err(MapsError::Api {
                status: response.status,
                message: response.error_message.unwrap_or_default(),
            }),
        }
    }

    /// Geocode `(name, address)` pairs one after another. Never fails: any
    /// address that cannot be resolved gets synthetic coordinates.
    pub async fn geocode_all(&self, places: &[(String, String)]) -> GeocodeBatch {
        info!("Geocoding batch of {} addresses", places.len());

        let mut waypoints = Vec::with_capacity(places.len());
        let mut fallback_count = 0;

        for (position, (name, address)) in places.iter().enumerate() {
            let resolved = if self.is_available() {
                match self.geocode(address).await {
                    Ok(coords) => coords,
                    Err(e) => {
                        warn!("Geocoding '{}' failed: {}", address, e);
                        None
                    }
                }
            } else {
                None
            };

            let coords = match resolved {
                Some(coords) => coords,
                None => {
                    fallback_count += 1;
                    let coords = fallback_coordinates(waypoints.len());
                    info!(
                        "Using fallback coordinates for '{}': ({:.4}, {:.4})",
                        name, coords.lat, coords.lng
                    );
                    coords
                }
            };
            waypoints.push(Waypoint::new(name.clone(), address.clone(), coords));

            if self.is_available() && position + 1 < places.len() && !self.request_delay.is_zero() {
                tokio::time::sleep(self.request_delay).await;
            }
        }

        let note = if fallback_count == 0 {
            None
        } else if !self.is_available() {
            Some("지도 API 키가 없어 예시 좌표로 표시합니다.".to_string())
        } else {
            Some(format!(
                "{}개 장소의 위치를 찾지 못해 예시 좌표로 표시합니다.",
                fallback_count
            ))
        };

        GeocodeBatch {
            waypoints,
            fallback_count,
            note,
        }
    }

    /// Ask the Directions API to reorder the interior stops. The first and
    /// last waypoints stay as origin and destination. Returns the visiting
    /// order as indices into `waypoints`.
    pub async fn optimize_waypoint_order(
        &self,
        waypoints: &[Waypoint],
    ) -> Result<Vec<usize>, MapsError> {
        let api_key = self.api_key.as_deref().ok_or(MapsError::Unavailable)?;
        if waypoints.len() <= 2 {
            return Ok((0..waypoints.len()).collect());
        }

        let as_param = |w: &Waypoint| format!("{},{}", w.lat, w.lng);
        let origin = as_param(&waypoints[0]);
        let destination = as_param(&waypoints[waypoints.len() - 1]);
        let interior = &waypoints[1..waypoints.len() - 1];
        let stops = std::iter::once("optimize:true".to_string())
            .chain(interior.iter().map(as_param))
            .collect::<Vec<_>>()
            .join("|");

        let url = format!("{}/maps/api/directions/json", self.base_url);
        let response: DirectionsResponse = self
            .http_client
            .get(&url)
            .query(&[
                ("origin", origin.as_str()),
                ("destination", destination.as_str()),
                ("waypoints", stops.as_str()),
                ("key", api_key),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "OK" {
            return Err(MapsError::Api {
                status: response.status,
                message: response.error_message.unwrap_or_default(),
            });
        }

        let order = response
            .routes
            .into_iter()
            .next()
            .map(|r| r.waypoint_order)
            .ok_or_else(|| MapsError::InvalidRoute("no routes".to_string()))?;

        validate_interior_order(&order, interior.len())?;

        let mut full = Vec::with_capacity(waypoints.len());
        full.push(0);
        full.extend(order.into_iter().map(|i| i + 1));
        full.push(waypoints.len() - 1);
        Ok(full)
    }
}

fn validate_interior_order(order: &[usize], interior_len: usize) -> Result<(), MapsError> {
    let mut seen = vec![false; interior_len];
    if order.len() != interior_len {
        return Err(MapsError::InvalidRoute(format!(
            "expected {} interior stops, got {}",
            interior_len,
            order.len()
        )));
    }
    for &index in order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(MapsError::InvalidRoute(format!(
                    "waypoint order {:?} is not a permutation",
                    order
                )))
            }
        }
    }
    Ok(())
}
