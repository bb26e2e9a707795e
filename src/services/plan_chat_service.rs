//! Conversational edits of an existing itinerary.
//!
//! The model must answer inside a `RESPONSE_START … RESPONSE_END` envelope
//! holding a short summary followed by `JSON_START … JSON_END` with the whole
//! revised plan. Unlike first-time generation there is no fallback here: a reply
//! that breaks the envelope is an error and the caller keeps the old plan.

use std::sync::OnceLock;

use log::{info, warn};
use regex::Regex;
use serde::Serialize;

use crate::models::itinerary::Itinerary;
use crate::services::gemini_service::{GeminiError, GeminiService};

pub const DEFAULT_SUMMARY: &str = "AI가 계획을 수정했습니다.";

fn response_envelope() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"RESPONSE_START\s*([\s\S]*?)\s*RESPONSE_END").expect("valid regex")
    })
}

fn json_envelope() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"JSON_START\s*([\s\S]*?)\s*JSON_END").expect("valid regex"))
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChatParseError {
    #[error("reply is missing the RESPONSE_START/RESPONSE_END envelope")]
    MissingResponseEnvelope,
    #[error("reply is missing the JSON_START/JSON_END envelope")]
    MissingJsonEnvelope,
    #[error("revised plan is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("revised plan is not an array of days: {0}")]
    InvalidShape(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PlanChatError {
    #[error(transparent)]
    Model(#[from] GeminiError),
    #[error("could not read the model's revision: {0}")]
    Parse(#[from] ChatParseError),
}

/// A decoded revision: what changed, in words, and the full new plan.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PlanRevision {
    pub summary: String,
    pub itinerary: Itinerary,
}

pub fn build_chat_prompt(current: &Itinerary, user_message: &str) -> String {
    let current_json =
        serde_json::to_string_pretty(current).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"
현재 여행 계획:
{current_json}

사용자 요청: "{message}"

위의 현재 여행 계획을 기반으로 사용자의 요청을 반영하여 계획을 수정해주세요.

다음 규칙을 따라주세요:
1. 사용자 요청을 분석하여 적절한 수정사항을 적용
2. 기존 계획의 구조와 형식(id, title, day, activities)을 유지
3. 응답은 다음 형식으로만 제공:

RESPONSE_START
{{수정된 계획에 대한 간단한 설명}}
JSON_START
[수정된 전체 여행 계획 JSON]
JSON_END
RESPONSE_END

중요: 반드시 위 형식을 정확히 따라주세요.
"#,
        message = user_message.trim()
    )
}

/// Strictly decode an envelope reply.
pub fn parse_chat_reply(reply: &str) -> Result<PlanRevision, ChatParseError> {
    let envelope = response_envelope()
        .captures(reply)
        .and_then(|c| c.get(1))
        .ok_or(ChatParseError::MissingResponseEnvelope)?
        .as_str();

    let json_match = json_envelope()
        .captures(envelope)
        .ok_or(ChatParseError::MissingJsonEnvelope)?;
    let json_text = json_match
        .get(1)
        .map(|m| m.as_str().trim())
        .ok_or(ChatParseError::MissingJsonEnvelope)?;

    let summary_end = json_match.get(0).map(|m| m.start()).unwrap_or(0);
    let summary = envelope[..summary_end].trim();
    let summary = if summary.is_empty() {
        DEFAULT_SUMMARY.to_string()
    } else {
        summary.to_string()
    };

    let value: serde_json::Value =
        serde_json::from_str(json_text).map_err(|e| ChatParseError::InvalidJson(e.to_string()))?;
    if !value.is_array() {
        return Err(ChatParseError::InvalidShape("expected a JSON array".to_string()));
    }

    let mut itinerary: Itinerary =
        serde_json::from_value(value).map_err(|e| ChatParseError::InvalidShape(e.to_string()))?;
    itinerary.normalize();
    itinerary.canonicalize();

    Ok(PlanRevision { summary, itinerary })
}

pub struct PlanChatService {
    gemini: GeminiService,
}

impl PlanChatService {
    pub fn new(gemini: GeminiService) -> Self {
        Self { gemini }
    }

    pub async fn revise(
        &self,
        current: &Itinerary,
        user_message: &str,
    ) -> Result<PlanRevision, PlanChatError> {
        let prompt = build_chat_prompt(current, user_message);
        let reply = self.gemini.generate(&prompt).await?;

        let revision = parse_chat_reply(&reply).map_err(|e| {
            warn!("Rejecting chat revision: {}", e);
            e
        })?;
        info!(
            "Chat revision: {} days, {} activities",
            revision.itinerary.days.len(),
            revision.itinerary.activity_count()
        );
        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"[{"id":"plan-0","title":"1일차 - 맛집","day":1,"activities":[{"id":"activity-0-0","time":"12:00","activity":"돼지국밥","location":"부산 서면","description":"점심","duration":60}]}]"#;

    #[test]
    fn test_parse_valid_envelope() {
        let reply = format!(
            "물론이죠!\nRESPONSE_START\n첫째 날에 맛집을 추가했습니다.\nJSON_START\n{}\nJSON_END\nRESPONSE_END\n감사합니다",
            PLAN
        );
        let revision = parse_chat_reply(&reply).unwrap();
        assert_eq!(revision.summary, "첫째 날에 맛집을 추가했습니다.");
        assert_eq!(revision.itinerary.days[0].activities[0].name, "돼지국밥");
    }

    #[test]
    fn test_empty_summary_uses_default() {
        let reply = format!("RESPONSE_START\nJSON_START\n{}\nJSON_END\nRESPONSE_END", PLAN);
        assert_eq!(parse_chat_reply(&reply).unwrap().summary, DEFAULT_SUMMARY);
    }

    #[test]
    fn test_missing_response_envelope_is_error() {
        let reply = format!("JSON_START\n{}\nJSON_END", PLAN);
        assert_eq!(
            parse_chat_reply(&reply),
            Err(ChatParseError::MissingResponseEnvelope)
        );
        assert_eq!(
            parse_chat_reply(&format!("RESPONSE_START\nJSON_START\n{}\nJSON_END", PLAN)),
            Err(ChatParseError::MissingResponseEnvelope)
        );
    }

    #[test]
    fn test_missing_json_envelope_is_error() {
        let reply = format!("RESPONSE_START\n바꿨어요\n{}\nRESPONSE_END", PLAN);
        assert_eq!(parse_chat_reply(&reply), Err(ChatParseError::MissingJsonEnvelope));
    }

    #[test]
    fn test_invalid_interior_json_is_error() {
        let reply = "RESPONSE_START\n설명\nJSON_START\n[{\"title\": \nJSON_END\nRESPONSE_END";
        assert!(matches!(
            parse_chat_reply(reply),
            Err(ChatParseError::InvalidJson(_))
        ));

        let reply = "RESPONSE_START\n설명\nJSON_START\n{\"day\": 1}\nJSON_END\nRESPONSE_END";
        assert!(matches!(
            parse_chat_reply(reply),
            Err(ChatParseError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_chat_prompt_carries_plan_and_request() {
        let plan: Itinerary = serde_json::from_str(PLAN).unwrap();
        let prompt = build_chat_prompt(&plan, "  둘째 날을 여유롭게 ");
        assert!(prompt.contains("\"activity\": \"돼지국밥\""));
        assert!(prompt.contains("사용자 요청: \"둘째 날을 여유롭게\""));
        assert!(prompt.contains("RESPONSE_START"));
        assert!(prompt.contains("JSON_END"));
    }
}
