pub mod collaboration;
pub mod itinerary;
pub mod recommendation;
pub mod waypoint;
