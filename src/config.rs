use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::{info, warn};

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const DEFAULT_DATABASE: &str = "TravelFlow";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MAPS_BASE_URL: &str = "https://maps.googleapis.com";
const DEFAULT_GEOCODE_DELAY_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 4096,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone)]
pub struct MapsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub geocode_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,
    pub gemini: GeminiConfig,
    pub maps: MapsConfig,
    /// Keep the last waypoint last when the local route heuristic runs.
    pub pin_route_destination: bool,
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: try_load("HOST", HOST),
            port: try_load("PORT", &PORT.to_string()),
            mongodb_uri: secret("MONGODB_URI"),
            mongodb_database: try_load("MONGODB_DATABASE", DEFAULT_DATABASE),
            gemini: GeminiConfig {
                api_key: secret("GEMINI_API_KEY"),
                model: try_load("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                base_url: try_load("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
                generation: GenerationConfig::default(),
            },
            maps: MapsConfig {
                api_key: secret("GOOGLE_MAPS_API_KEY"),
                base_url: try_load("MAPS_BASE_URL", DEFAULT_MAPS_BASE_URL),
                geocode_delay: Duration::from_millis(try_load(
                    "GEOCODE_DELAY_MS",
                    &DEFAULT_GEOCODE_DELAY_MS.to_string(),
                )),
            },
            pin_route_destination: try_load("ROUTE_PIN_DESTINATION", "true"),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "default_secret".to_string()),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value '{raw}': {e}, using default: {default}");
        // Defaults are compile-time constants of the right type.
        default
            .parse()
            .unwrap_or_else(|_| panic!("default for {key} does not parse"))
    })
}

/// Credentials are optional; an empty value counts as unset.
fn secret(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => {
            warn!("{key} not configured");
            None
        }
    }
}
