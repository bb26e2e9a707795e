use std::time::Duration;

use log::{debug, error, info};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{GeminiConfig, GenerationConfig};

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfigBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfigBody {
    pub temperature: f32,
    #[serde(rename = "topK")]
    pub top_k: u32,
    #[serde(rename = "topP")]
    pub top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

impl From<&GenerationConfig> for GenerationConfigBody {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate.
    pub fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Failures talking to the text model, split so callers can tell the user
/// what actually went wrong. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("Gemini API key is not configured")]
    MissingApiKey,
    #[error("Gemini API key was rejected (401)")]
    InvalidCredentials,
    #[error("Gemini API key is not allowed to use this model (403)")]
    Forbidden,
    #[error("Gemini rate limit exceeded (429)")]
    RateLimited,
    #[error("Gemini rejected the request with status {status}: {body}")]
    BadRequest { status: u16, body: String },
    #[error("Gemini returned server error {status}")]
    Upstream { status: u16 },
    #[error("Could not reach Gemini: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Gemini response had no text: {0}")]
    EmptyResponse(String),
}

impl GeminiError {
    /// Classify a non-success status code.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 => GeminiError::InvalidCredentials,
            403 => GeminiError::Forbidden,
            429 => GeminiError::RateLimited,
            code @ 400..=499 => GeminiError::BadRequest { status: code, body },
            code => GeminiError::Upstream { status: code },
        }
    }
}

#[derive(Clone)]
pub struct GeminiService {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    generation: GenerationConfig,
}

impl GeminiService {
    pub fn new(config: &GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            generation: config.generation.clone(),
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Send a single-turn prompt and return the reply text.
    pub async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::MissingApiKey)?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: (&self.generation).into(),
        };

        info!(
            "Sending prompt to {} ({} chars)",
            self.model,
            prompt.chars().count()
        );

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini request failed: {}", e);
                GeminiError::Network(e)
            })?;

        let status = response.status();
        info!("Gemini responded with status {}", status);

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GeminiError::from_status(status, body));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::EmptyResponse(format!("failed to decode body: {}", e)))?;

        let text = body
            .first_text()
            .ok_or_else(|| GeminiError::EmptyResponse("no candidate text".to_string()))?;

        debug!("Gemini reply: {}", text);
        Ok(text)
    }
}
