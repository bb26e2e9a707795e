use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::Serialize;
use std::collections::HashMap;
use std::env;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

impl ServiceStatus {
    fn ok(details: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            details: Some(details.into()),
        }
    }

    fn error(details: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            details: Some(details.into()),
        }
    }
}

pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let storage = check_storage(&state).await;
    if storage.status != "ok" {
        health.status = "degraded".to_string();
    }
    health.services.insert("storage".to_string(), storage);

    // Missing keys are reported but do not degrade the overall status.
    health.services.insert(
        "gemini".to_string(),
        check_credential(state.config.gemini.api_key.as_deref(), "GEMINI_API_KEY"),
    );
    health.services.insert(
        "google_maps".to_string(),
        check_credential(state.config.maps.api_key.as_deref(), "GOOGLE_MAPS_API_KEY"),
    );

    HttpResponse::Ok().json(health)
}

async fn check_storage(state: &AppState) -> ServiceStatus {
    let backend = state.repository.backend();
    match state.repository.ping().await {
        Ok(_) => ServiceStatus::ok(format!("{} store reachable", backend)),
        Err(e) => {
            error!("Storage health check failed: {}", e);
            ServiceStatus::error(format!("Failed to reach {} store: {}", backend, e))
        }
    }
}

fn check_credential(key: Option<&str>, name: &str) -> ServiceStatus {
    match key {
        Some(key) => {
            let masked_key = if key.is_ascii() && key.len() > 8 {
                format!("{}***{}", &key[0..4], &key[key.len() - 4..])
            } else {
                "***".to_string()
            };
            ServiceStatus::ok(format!("{} configured ({})", name, masked_key))
        }
        None => ServiceStatus::error(format!("{} not configured", name)),
    }
}
