#![allow(dead_code)]

use actix_cors::Cors;
use actix_web::{http::StatusCode, middleware::Logger, web, App, HttpResponse, HttpServer};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;

use travelflow_api::config::{AppConfig, GeminiConfig, GenerationConfig, MapsConfig};
use travelflow_api::middleware::auth::generate_token;
use travelflow_api::repository::{InMemoryRepository, Repository};
use travelflow_api::routes;
use travelflow_api::services::recommendation_service::seed_recommendations;
use travelflow_api::state::AppState;

pub const TEST_JWT_SECRET: &str = "test_secret";

pub struct TestApp {
    pub state: web::Data<AppState>,
}

impl TestApp {
    /// App backed by the in-memory store. `None` leaves the matching
    /// credential unset.
    pub async fn new(gemini_url: Option<&str>, maps_url: Option<&str>) -> Self {
        let repository = Repository::InMemory(InMemoryRepository::new());
        repository
            .seed_recommendations(&seed_recommendations())
            .await
            .expect("seed in-memory store");

        let state = AppState::new(test_config(gemini_url, maps_url), repository)
            .expect("build app state");

        Self {
            state: web::Data::new(state),
        }
    }

    pub async fn offline() -> Self {
        Self::new(None, None).await
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(|cfg| routes::configure(cfg, TEST_JWT_SECRET))
    }
}

pub fn test_config(gemini_url: Option<&str>, maps_url: Option<&str>) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        mongodb_uri: None,
        mongodb_database: "TravelFlowTest".to_string(),
        gemini: GeminiConfig {
            api_key: gemini_url.map(|_| "test-gemini-key".to_string()),
            model: "gemini-1.5-flash".to_string(),
            base_url: gemini_url.unwrap_or("http://127.0.0.1:9").to_string(),
            generation: GenerationConfig::default(),
        },
        maps: MapsConfig {
            api_key: maps_url.map(|_| "test-maps-key".to_string()),
            base_url: maps_url.unwrap_or("http://127.0.0.1:9").to_string(),
            geocode_delay: Duration::from_millis(0),
        },
        pin_route_destination: true,
        jwt_secret: TEST_JWT_SECRET.to_string(),
    }
}

pub fn bearer(user_id: &str, name: &str) -> String {
    let token = generate_token(
        TEST_JWT_SECRET,
        &format!("{}@example.com", user_id),
        user_id,
        name,
    )
    .expect("sign test token");
    format!("Bearer {}", token)
}

pub fn sample_trip() -> serde_json::Value {
    json!({
        "destination": "부산",
        "startDate": "2024-03-15",
        "endDate": "2024-03-16",
        "travelers": 2,
        "interests": "맛집, 바다",
        "budget": 500000,
        "preferences": {
            "mustVisitPlaces": ["감천문화마을"],
            "maxWalkingDistanceKm": 5
        }
    })
}

pub fn sample_plan() -> serde_json::Value {
    json!([
        {
            "title": "1일차 - 해운대",
            "day": 1,
            "activities": [
                {"time": "10:00", "activity": "해수욕장", "location": "부산 해운대구 우동"},
                {"time": "12:00", "activity": "밀면", "location": "부산 해운대구 구남로 29"}
            ]
        },
        {
            "title": "2일차 - 감천",
            "day": 2,
            "activities": [
                {"time": "10:00", "activity": "감천문화마을", "location": "부산 사하구 감내2로 203"}
            ]
        }
    ])
}

struct MockGemini {
    status: u16,
    reply: String,
    delay: Duration,
}

async fn mock_generate(mock: web::Data<MockGemini>) -> HttpResponse {
    if !mock.delay.is_zero() {
        actix_rt::time::sleep(mock.delay).await;
    }
    if mock.status != 200 {
        let status = StatusCode::from_u16(mock.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return HttpResponse::build(status).json(json!({"error": {"message": "mock failure"}}));
    }
    HttpResponse::Ok().json(json!({
        "candidates": [{"content": {"parts": [{"text": mock.reply}]}}]
    }))
}

/// Spawn a stand-in for the text model that always answers with `reply`
/// (or fails with `status`). Returns its base URL.
pub async fn spawn_mock_gemini(status: u16, reply: &str) -> String {
    spawn_slow_mock_gemini(status, reply, Duration::ZERO).await
}

/// Like [`spawn_mock_gemini`], but every answer is held back for `delay`.
pub async fn spawn_slow_mock_gemini(status: u16, reply: &str, delay: Duration) -> String {
    let mock = web::Data::new(MockGemini {
        status,
        reply: reply.to_string(),
        delay,
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(mock.clone())
            .route("/v1beta/models/{tail}*", web::post().to(mock_generate))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind mock gemini");

    let port = server.addrs()[0].port();
    actix_rt::spawn(server.run());
    format!("http://127.0.0.1:{}", port)
}

/// Base URL of a local port with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).expect("reserve port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

struct MockMaps {
    places: HashMap<String, (f64, f64)>,
}

async fn mock_geocode(
    mock: web::Data<MockMaps>,
    query: web::Query<HashMap<String, String>>,
) -> HttpResponse {
    let address = query.get("address").cloned().unwrap_or_default();
    match mock.places.get(&address) {
        Some((lat, lng)) => HttpResponse::Ok().json(json!({
            "status": "OK",
            "results": [{
                "formatted_address": address,
                "geometry": {"location": {"lat": lat, "lng": lng}}
            }]
        })),
        None => HttpResponse::Ok().json(json!({"status": "ZERO_RESULTS", "results": []})),
    }
}

async fn mock_directions(query: web::Query<HashMap<String, String>>) -> HttpResponse {
    // Visit the interior stops in reverse order.
    let interior = query
        .get("waypoints")
        .map(|w| w.split('|').skip(1).count())
        .unwrap_or(0);
    let order: Vec<usize> = (0..interior).rev().collect();
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "routes": [{"waypoint_order": order}]
    }))
}

/// Spawn a stand-in for the geocoding and directions APIs that knows the
/// given addresses. Returns its base URL.
pub async fn spawn_mock_maps(places: &[(&str, f64, f64)]) -> String {
    let mock = web::Data::new(MockMaps {
        places: places
            .iter()
            .map(|(address, lat, lng)| (address.to_string(), (*lat, *lng)))
            .collect(),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(mock.clone())
            .route("/maps/api/geocode/json", web::get().to(mock_geocode))
            .route("/maps/api/directions/json", web::get().to(mock_directions))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind mock maps");

    let port = server.addrs()[0].port();
    actix_rt::spawn(server.run());
    format!("http://127.0.0.1:{}", port)
}
