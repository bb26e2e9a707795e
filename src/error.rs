use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::models::itinerary::TripRequestError;
use crate::repository::RepositoryError;
use crate::services::collaboration_service::CollaborationError;
use crate::services::gemini_service::GeminiError;
use crate::services::itinerary_service::ItineraryError;
use crate::services::plan_chat_service::{ChatParseError, PlanChatError};
use crate::services::recommendation_service::RecommendationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("plan '{0}' not found")]
    PlanNotFound(String),

    #[error("a newer request for plan '{0}' replaced this one")]
    StaleResponse(String),

    #[error(transparent)]
    Model(#[from] GeminiError),

    #[error("the AI reply could not be applied: {0}")]
    ModelReply(#[from] ChatParseError),

    #[error(transparent)]
    TripRequest(#[from] TripRequestError),

    #[error(transparent)]
    Itinerary(#[from] ItineraryError),

    #[error(transparent)]
    Recommendation(#[from] RecommendationError),

    #[error(transparent)]
    Collaboration(#[from] CollaborationError),

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<PlanChatError> for ApiError {
    fn from(err: PlanChatError) -> Self {
        match err {
            PlanChatError::Model(e) => ApiError::Model(e),
            PlanChatError::Parse(e) => ApiError::ModelReply(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    /// Machine readable error kind sent to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) | ApiError::TripRequest(_) => "invalid_request",
            ApiError::PlanNotFound(_) => "plan_not_found",
            ApiError::StaleResponse(_) => "stale_response",
            ApiError::Model(e) => match e {
                GeminiError::MissingApiKey => "missing_api_key",
                GeminiError::InvalidCredentials => "invalid_api_key",
                GeminiError::Forbidden => "forbidden",
                GeminiError::RateLimited => "rate_limited",
                GeminiError::BadRequest { .. } => "model_bad_request",
                GeminiError::Upstream { .. } => "upstream_error",
                GeminiError::Network(_) => "network_error",
                GeminiError::EmptyResponse(_) => "empty_response",
            },
            ApiError::ModelReply(_) => "invalid_model_reply",
            ApiError::Itinerary(ItineraryError::MissingField(_)) => "invalid_request",
            ApiError::Itinerary(_) => "not_found",
            ApiError::Recommendation(e) => match e {
                RecommendationError::MissingField(_) => "invalid_request",
                RecommendationError::Repository(_) => "storage_error",
                _ => "not_found",
            },
            ApiError::Collaboration(e) => match e {
                CollaborationError::PollNotFound(_) | CollaborationError::OptionNotFound(_) => {
                    "not_found"
                }
                CollaborationError::PollClosed => "poll_closed",
                CollaborationError::NotPollCreator => "forbidden",
                CollaborationError::AlreadyInvited(_) => "conflict",
                _ => "invalid_request",
            },
            ApiError::Repository(_) => "storage_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::TripRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PlanNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::StaleResponse(_) => StatusCode::CONFLICT,
            ApiError::Model(e) => match e {
                GeminiError::MissingApiKey | GeminiError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                GeminiError::Forbidden => StatusCode::FORBIDDEN,
                GeminiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                GeminiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
                GeminiError::Upstream { .. } | GeminiError::EmptyResponse(_) => {
                    StatusCode::BAD_GATEWAY
                }
                GeminiError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::ModelReply(_) => StatusCode::BAD_GATEWAY,
            ApiError::Itinerary(ItineraryError::MissingField(_)) => StatusCode::BAD_REQUEST,
            ApiError::Itinerary(_) => StatusCode::NOT_FOUND,
            ApiError::Recommendation(e) => match e {
                RecommendationError::MissingField(_) => StatusCode::BAD_REQUEST,
                RecommendationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::NOT_FOUND,
            },
            ApiError::Collaboration(e) => match e {
                CollaborationError::PollNotFound(_) | CollaborationError::OptionNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CollaborationError::PollClosed | CollaborationError::AlreadyInvited(_) => {
                    StatusCode::CONFLICT
                }
                CollaborationError::NotPollCreator => StatusCode::FORBIDDEN,
                _ => StatusCode::BAD_REQUEST,
            },
            ApiError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        HttpResponse::build(status).json(ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode as UpstreamStatus;

    #[test]
    fn test_model_status_mapping() {
        let cases = [
            (401, StatusCode::UNAUTHORIZED),
            (403, StatusCode::FORBIDDEN),
            (429, StatusCode::TOO_MANY_REQUESTS),
            (404, StatusCode::BAD_REQUEST),
            (500, StatusCode::BAD_GATEWAY),
            (503, StatusCode::BAD_GATEWAY),
        ];
        for (upstream, expected) in cases {
            let err = GeminiError::from_status(
                UpstreamStatus::from_u16(upstream).unwrap(),
                String::new(),
            );
            assert_eq!(ApiError::from(err).status_code(), expected, "{}", upstream);
        }
        assert_eq!(
            ApiError::from(GeminiError::MissingApiKey).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_chat_errors_split_by_cause() {
        let parse: ApiError = PlanChatError::Parse(ChatParseError::MissingJsonEnvelope).into();
        assert_eq!(parse.kind(), "invalid_model_reply");
        assert_eq!(parse.status_code(), StatusCode::BAD_GATEWAY);

        let model: ApiError = PlanChatError::Model(GeminiError::RateLimited).into();
        assert_eq!(model.kind(), "rate_limited");
    }

    #[test]
    fn test_domain_errors() {
        assert_eq!(
            ApiError::from(ItineraryError::DayNotFound("d".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(CollaborationError::PollClosed).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::StaleResponse("trip".into()).kind(),
            "stale_response"
        );
    }
}
