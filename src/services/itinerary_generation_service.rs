//! Itinerary Generation Service
//!
//! Turns a trip request into a single prompt for the text model and recovers a
//! typed [`Itinerary`] from whatever the model sends back.
//!
//! ## Decoding order
//! 1. A fenced ```` ```json ```` block, if present
//! 2. Otherwise the first `[` through the last `]`
//! 3. If neither yields a JSON array of days, a one-day fallback plan
//!
//! The decoder never fails: a bad reply degrades to the fallback plan and the
//! reason is reported alongside it.

use std::fmt::Write;
use std::sync::OnceLock;

use log::{info, warn};
use regex::Regex;
use serde::Serialize;

use crate::models::itinerary::{Activity, Day, Itinerary, TripPreferences, TripRequest};
use crate::services::gemini_service::{GeminiError, GeminiService};

pub const FALLBACK_ACTIVITY_NAME: &str = "여행 시작";
pub const FALLBACK_DESCRIPTION: &str =
    "AI 응답을 일정으로 변환하지 못했습니다. 다시 생성하거나 직접 일정을 편집해주세요.";

fn fenced_json_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").expect("valid regex"))
}

/// Result of decoding a model reply on the primary generation path.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Parsed(Itinerary),
    Fallback { itinerary: Itinerary, reason: String },
}

impl DecodeOutcome {
    pub fn itinerary(&self) -> &Itinerary {
        match self {
            DecodeOutcome::Parsed(itinerary) => itinerary,
            DecodeOutcome::Fallback { itinerary, .. } => itinerary,
        }
    }

    pub fn into_itinerary(self) -> Itinerary {
        match self {
            DecodeOutcome::Parsed(itinerary) => itinerary,
            DecodeOutcome::Fallback { itinerary, .. } => itinerary,
        }
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            DecodeOutcome::Parsed(_) => None,
            DecodeOutcome::Fallback { reason, .. } => Some(reason),
        }
    }
}

/// Build the generation prompt for a trip request.
///
/// Every optional preference list is emitted as its own numbered section, and
/// omitted entirely when empty.
pub fn build_prompt(request: &TripRequest) -> String {
    let days = request.trip_length_days();
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "당신은 여행 일정 전문가입니다. 아래 조건에 맞는 {}일 여행 일정을 만들어주세요.",
        days
    );
    prompt.push('\n');
    prompt.push_str("여행 정보:\n");
    let _ = writeln!(prompt, "- 목적지: {}", request.destination);
    let _ = writeln!(
        prompt,
        "- 여행 기간: {} ~ {} (총 {}일)",
        request.start_date, request.end_date, days
    );
    let _ = writeln!(prompt, "- 여행 인원: {}명", request.travelers);
    let _ = writeln!(prompt, "- 관심사 및 취향: {}", request.interests.trim());
    let _ = writeln!(prompt, "- 총 예산: {}원", format_amount(request.budget));

    if let Some(preferences) = &request.preferences {
        write_preferences(&mut prompt, preferences);
    }

    prompt.push('\n');
    let _ = writeln!(
        prompt,
        "각 날짜마다 시간 순서대로 활동을 배치하고, 모든 장소는 지도에서 검색 가능한 실제 주소로 적어주세요. 반드시 {}일치 일정을 모두 포함해야 합니다.",
        days
    );
    prompt.push('\n');
    prompt.push_str(
        "응답 형식: 다른 설명이나 문장 없이 아래 구조의 JSON 배열만 반환하세요.\n\
[\n  {\n    \"title\": \"1일차 - 일정 제목\",\n    \"day\": 1,\n    \"activities\": [\n      {\n        \"time\": \"09:00\",\n        \"activity\": \"활동 이름\",\n        \"location\": \"상세 주소\",\n        \"description\": \"활동 설명\"\n      }\n    ]\n  }\n]\n",
    );

    prompt
}

fn write_preferences(prompt: &mut String, preferences: &TripPreferences) {
    write_numbered_section(prompt, "필수 방문 장소", &preferences.must_visit_places);
    write_numbered_section(prompt, "꼭 해보고 싶은 활동", &preferences.must_do_activities);
    write_numbered_section(prompt, "피하고 싶은 장소", &preferences.avoid_places);
    write_numbered_section(prompt, "피하고 싶은 활동", &preferences.avoid_activities);

    if let Some(km) = preferences.max_walking_distance_km {
        prompt.push('\n');
        let _ = writeln!(prompt, "이동 조건: 하루 최대 도보 거리 {}km 이내", km);
    }
    if let Some(budget) = preferences.budget_per_activity {
        prompt.push('\n');
        let _ = writeln!(prompt, "활동당 예산: {}원 이하", format_amount(budget));
    }
}

fn write_numbered_section(prompt: &mut String, header: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    prompt.push('\n');
    let _ = writeln!(prompt, "{}:", header);
    for (index, item) in items.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", index + 1, item);
    }
}

fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Slice out the JSON payload from a free-text reply.
fn extract_json_payload(reply: &str) -> Option<&str> {
    if let Some(captures) = fenced_json_pattern().captures(reply) {
        return captures.get(1).map(|m| m.as_str());
    }

    let start = reply.find('[')?;
    let end = reply.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}

/// Decode the model's reply into an itinerary. Never fails.
pub fn decode_itinerary(reply: &str, destination: &str) -> DecodeOutcome {
    match try_decode(reply) {
        Ok(itinerary) => DecodeOutcome::Parsed(itinerary),
        Err(reason) => {
            warn!("Falling back to single-day itinerary: {}", reason);
            DecodeOutcome::Fallback {
                itinerary: fallback_itinerary(destination),
                reason,
            }
        }
    }
}

fn try_decode(reply: &str) -> Result<Itinerary, String> {
    let payload = extract_json_payload(reply).ok_or("no JSON array found in reply")?;

    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| format!("invalid JSON: {}", e))?;
    if !value.is_array() {
        return Err("JSON payload is not an array".to_string());
    }

    let mut itinerary: Itinerary = serde_json::from_value(value)
        .map_err(|e| format!("array does not match the day structure: {}", e))?;
    itinerary.normalize();
    itinerary.canonicalize();
    Ok(itinerary)
}

/// The one-day plan returned when the reply cannot be decoded.
pub fn fallback_itinerary(destination: &str) -> Itinerary {
    Itinerary::new(vec![Day {
        id: "plan-0".to_string(),
        title: format!("1일차 - {}", destination),
        day_number: 1,
        activities: vec![Activity {
            id: "activity-0-0".to_string(),
            time: "09:00".to_string(),
            name: FALLBACK_ACTIVITY_NAME.to_string(),
            location_text: destination.to_string(),
            description: FALLBACK_DESCRIPTION.to_string(),
            duration_minutes: crate::models::itinerary::DEFAULT_DURATION_MINUTES,
        }],
    }])
}

#[derive(Debug, Serialize, Clone)]
pub struct GenerationResult {
    pub itinerary: Itinerary,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<DecodeOutcome> for GenerationResult {
    fn from(outcome: DecodeOutcome) -> Self {
        match outcome {
            DecodeOutcome::Parsed(itinerary) => Self {
                itinerary,
                fallback: false,
                note: None,
            },
            DecodeOutcome::Fallback { itinerary, reason } => Self {
                itinerary,
                fallback: true,
                note: Some(reason),
            },
        }
    }
}

pub struct ItineraryGenerator {
    gemini: GeminiService,
}

impl ItineraryGenerator {
    pub fn new(gemini: GeminiService) -> Self {
        Self { gemini }
    }

    /// Generate a new itinerary. Transport failures propagate; malformed
    /// replies come back as a fallback result.
    pub async fn generate(&self, request: &TripRequest) -> Result<GenerationResult, GeminiError> {
        let prompt = build_prompt(request);
        info!(
            "Generating {}-day itinerary for {}",
            request.trip_length_days(),
            request.destination
        );

        let reply = self.gemini.generate(&prompt).await?;
        Ok(decode_itinerary(&reply, &request.destination).into())
    }
}
