//! Route Optimization Service
//!
//! Reorders the stops of a day so the map shows a sensible visiting path.
//!
//! ## Strategy
//! - When a Google Maps key is configured, the Directions API's own waypoint
//!   optimisation wins. It keeps the origin and destination fixed.
//! - Otherwise a greedy nearest-neighbour walk over haversine distances runs
//!   locally. It is fast and good enough for the handful of stops in a day,
//!   but gives no guarantee of the shortest total distance.

use log::{info, warn};
use serde::Serialize;

use crate::models::waypoint::{LatLng, Waypoint};
use crate::services::geocoding_service::GeocodingService;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two points in decimal degrees.
pub fn haversine_km(from: LatLng, to: LatLng) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lon = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Which ends of the route stay where they are during local optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EndpointPolicy {
    /// Only the first stop is fixed; the walk may end anywhere.
    OriginOnly,
    /// First and last stops are fixed; only interior stops move.
    OriginAndDestination,
}

/// Greedy nearest-neighbour order starting from the first waypoint.
/// Inputs with two or fewer waypoints come back unchanged.
pub fn nearest_neighbor_order(waypoints: Vec<Waypoint>) -> Vec<Waypoint> {
    if waypoints.len() <= 2 {
        return waypoints;
    }

    let mut remaining = waypoints;
    let mut optimized = vec![remaining.remove(0)];

    while !remaining.is_empty() {
        let current = optimized[optimized.len() - 1].coords();
        let mut nearest_idx = 0;
        let mut nearest_distance = haversine_km(current, remaining[0].coords());

        for (idx, candidate) in remaining.iter().enumerate().skip(1) {
            let distance = haversine_km(current, candidate.coords());
            if distance < nearest_distance {
                nearest_distance = distance;
                nearest_idx = idx;
            }
        }

        optimized.push(remaining.remove(nearest_idx));
    }

    optimized
}

/// Local heuristic honouring the given endpoint policy.
pub fn optimize_locally(waypoints: Vec<Waypoint>, policy: EndpointPolicy) -> Vec<Waypoint> {
    match policy {
        EndpointPolicy::OriginOnly => nearest_neighbor_order(waypoints),
        EndpointPolicy::OriginAndDestination => {
            if waypoints.len() <= 3 {
                return waypoints;
            }
            let mut head = waypoints;
            let destination = head.pop();
            let mut ordered = nearest_neighbor_order(head);
            ordered.extend(destination);
            ordered
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteSource {
    MapsService,
    LocalHeuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStats {
    pub stop_count: usize,
    pub total_distance_km: f64,
    pub legs_km: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedRoute {
    pub waypoints: Vec<Waypoint>,
    pub source: RouteSource,
    pub stats: RouteStats,
}

pub fn route_stats(waypoints: &[Waypoint]) -> RouteStats {
    let legs_km: Vec<f64> = waypoints
        .windows(2)
        .map(|pair| haversine_km(pair[0].coords(), pair[1].coords()))
        .collect();

    RouteStats {
        stop_count: waypoints.len(),
        total_distance_km: legs_km.iter().sum(),
        legs_km,
    }
}

pub struct RouteOptimizationService {
    maps: Option<GeocodingService>,
    policy: EndpointPolicy,
}

impl RouteOptimizationService {
    pub fn new(maps: Option<GeocodingService>, policy: EndpointPolicy) -> Self {
        Self { maps, policy }
    }

    pub fn policy(&self) -> EndpointPolicy {
        self.policy
    }

    pub async fn optimize(&self, waypoints: Vec<Waypoint>) -> OptimizedRoute {
        if waypoints.len() <= 2 {
            let stats = route_stats(&waypoints);
            return OptimizedRoute {
                waypoints,
                source: RouteSource::LocalHeuristic,
                stats,
            };
        }

        if let Some(maps) = self.maps.as_ref().filter(|m| m.is_available()) {
            match maps.optimize_waypoint_order(&waypoints).await {
                Ok(order) => {
                    info!("Using Directions API order {:?}", order);
                    let ordered: Vec<Waypoint> =
                        order.iter().map(|&i| waypoints[i].clone()).collect();
                    let stats = route_stats(&ordered);
                    return OptimizedRoute {
                        waypoints: ordered,
                        source: RouteSource::MapsService,
                        stats,
                    };
                }
                Err(e) => {
                    warn!("Directions API unavailable, optimising locally: {}", e);
                }
            }
        }

        info!(
            "Optimising {} waypoints locally ({:?})",
            waypoints.len(),
            self.policy
        );
        let ordered = optimize_locally(waypoints, self.policy);
        let stats = route_stats(&ordered);
        OptimizedRoute {
            waypoints: ordered,
            source: RouteSource::LocalHeuristic,
            stats,
        }
    }
}
