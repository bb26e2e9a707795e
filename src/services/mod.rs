pub mod collaboration_service;
pub mod gemini_service;
pub mod geocoding_service;
pub mod itinerary_generation_service;
pub mod itinerary_service;
pub mod plan_chat_service;
pub mod recommendation_service;
pub mod request_sequencer;
pub mod route_optimization_service;
