use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::itinerary::{
    ActivityPatch, Direction, Itinerary, NewActivity, StoredItinerary, TripRequest,
};
use crate::repository::TravelRepository;
use crate::services::geocoding_service::GeocodeBatch;
use crate::services::itinerary_service::ItineraryError;
use crate::services::route_optimization_service::OptimizedRoute;
use crate::state::AppState;

const SOURCE_AI: &str = "ai";
const SOURCE_MANUAL: &str = "manual";

#[derive(Debug, Deserialize)]
pub struct PlanUpdate {
    pub title: Option<String>,
    pub days: Itinerary,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct NewDay {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub direction: Direction,
}

#[derive(Debug, Deserialize, Default)]
pub struct MapRequest {
    pub day: Option<u32>,
    #[serde(default)]
    pub optimize: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapResponse {
    #[serde(flatten)]
    pub batch: GeocodeBatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<OptimizedRoute>,
}

async fn load_plan(state: &AppState, key: &str) -> Result<StoredItinerary, ApiError> {
    state
        .repository
        .load_itinerary(key)
        .await?
        .ok_or_else(|| ApiError::PlanNotFound(key.to_string()))
}

/// Load, change and store a plan in one go. The closure's value is returned
/// alongside the saved plan. Any model reply still pending for the plan is
/// superseded by the edit.
async fn edit_plan<T>(
    state: &AppState,
    key: &str,
    edit: impl FnOnce(&mut Itinerary) -> Result<T, ItineraryError>,
) -> Result<(StoredItinerary, T), ApiError> {
    let mut stored = load_plan(state, key).await?;
    let value = edit(&mut stored.days)?;
    state.sequencer.begin(key);
    stored.updated_at = Utc::now();
    state.repository.save_itinerary(&stored).await?;
    Ok((stored, value))
}

/*
    GET /api/plans/{key}
*/
pub async fn get_plan(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let stored = load_plan(&state, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(stored))
}

/*
    PUT /api/plans/{key}
*/
pub async fn put_plan(
    path: web::Path<String>,
    body: web::Json<PlanUpdate>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let key = path.into_inner();
    let PlanUpdate { title, mut days } = body.into_inner();
    days.normalize();
    days.canonicalize();

    state.sequencer.begin(&key);
    let stored = StoredItinerary::new(key, days).with_source(title, SOURCE_MANUAL);
    state.repository.save_itinerary(&stored).await?;
    Ok(HttpResponse::Ok().json(stored))
}

/*
    DELETE /api/plans/{key}
*/
pub async fn delete_plan(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let key = path.into_inner();
    state.sequencer.forget(&key);
    if state.repository.delete_itinerary(&key).await? {
        info!("Plan '{}' reset", key);
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ApiError::PlanNotFound(key))
    }
}

/*
    POST /api/plans/{key}/generate
*/
pub async fn generate(
    path: web::Path<String>,
    body: web::Json<TripRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let key = path.into_inner();
    let request = body.into_inner();
    request.validate()?;

    let ticket = state.sequencer.begin(&key);
    let result = state.generator.generate(&request).await?;

    if !state.sequencer.is_latest(&key, ticket) {
        warn!("Discarding stale generation for plan '{}'", key);
        return Err(ApiError::StaleResponse(key));
    }

    let title = format!("{} 여행", request.destination.trim());
    let stored =
        StoredItinerary::new(key, result.itinerary.clone()).with_source(Some(title), SOURCE_AI);
    state.repository.save_itinerary(&stored).await?;

    Ok(HttpResponse::Ok().json(result))
}

/*
    POST /api/plans/{key}/chat
*/
pub async fn chat(
    path: web::Path<String>,
    body: web::Json<ChatRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let key = path.into_inner();
    let message = body.into_inner().message;
    if message.trim().is_empty() {
        return Err(ApiError::InvalidRequest("message is required".to_string()));
    }

    let mut stored = load_plan(&state, &key).await?;
    let ticket = state.sequencer.begin(&key);
    let revision = state.chat.revise(&stored.days, &message).await?;

    if !state.sequencer.is_latest(&key, ticket) {
        warn!("Discarding stale chat revision for plan '{}'", key);
        return Err(ApiError::StaleResponse(key));
    }

    stored.days = revision.itinerary.clone();
    stored.updated_at = Utc::now();
    state.repository.save_itinerary(&stored).await?;

    Ok(HttpResponse::Ok().json(revision))
}

/*
    POST /api/plans/{key}/days
*/
pub async fn add_day(
    path: web::Path<String>,
    body: Option<web::Json<NewDay>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let title = body.and_then(|b| b.into_inner().title);
    let (_, day) = edit_plan(&state, &path.into_inner(), |plan| {
        Ok(plan.add_day(title).clone())
    })
    .await?;
    Ok(HttpResponse::Created().json(day))
}

/*
    DELETE /api/plans/{key}/days/{day_id}
*/
pub async fn remove_day(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (key, day_id) = path.into_inner();
    let (stored, _) = edit_plan(&state, &key, |plan| plan.remove_day(&day_id)).await?;
    Ok(HttpResponse::Ok().json(stored))
}

/*
    POST /api/plans/{key}/days/{day_id}/activities
*/
pub async fn add_activity(
    path: web::Path<(String, String)>,
    body: web::Json<NewActivity>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (key, day_id) = path.into_inner();
    let input = body.into_inner();
    let (_, activity) = edit_plan(&state, &key, |plan| {
        plan.add_activity(&day_id, input).cloned()
    })
    .await?;
    Ok(HttpResponse::Created().json(activity))
}

/*
    PATCH /api/plans/{key}/days/{day_id}/activities/{activity_id}
*/
pub async fn update_activity(
    path: web::Path<(String, String, String)>,
    body: web::Json<ActivityPatch>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (key, day_id, activity_id) = path.into_inner();
    let patch = body.into_inner();
    let (_, activity) = edit_plan(&state, &key, |plan| {
        plan.update_activity(&day_id, &activity_id, patch).cloned()
    })
    .await?;
    Ok(HttpResponse::Ok().json(activity))
}

/*
    DELETE /api/plans/{key}/days/{day_id}/activities/{activity_id}
*/
pub async fn delete_activity(
    path: web::Path<(String, String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (key, day_id, activity_id) = path.into_inner();
    edit_plan(&state, &key, |plan| plan.delete_activity(&day_id, &activity_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

/*
    POST /api/plans/{key}/days/{day_id}/activities/{activity_id}/move
*/
pub async fn move_activity(
    path: web::Path<(String, String, String)>,
    body: web::Json<MoveRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (key, day_id, activity_id) = path.into_inner();
    let direction = body.into_inner().direction;
    let (stored, _) = edit_plan(&state, &key, |plan| {
        plan.move_activity(&day_id, &activity_id, direction)
    })
    .await?;
    Ok(HttpResponse::Ok().json(stored))
}

/*
    GET /api/plans/{key}/share
*/
pub async fn share(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let stored = load_plan(&state, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "title": stored.title,
        "text": stored.days.share_text(),
    })))
}

/*
    POST /api/plans/{key}/map
*/
pub async fn map(
    path: web::Path<String>,
    body: Option<web::Json<MapRequest>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let key = path.into_inner();
    let request = body.map(|b| b.into_inner()).unwrap_or_default();
    let stored = load_plan(&state, &key).await?;

    let places = stored.days.locations(request.day);
    let batch = state.geocoder.geocode_all(&places).await;
    info!(
        "Plan '{}' map: {} waypoints, {} synthetic",
        key,
        batch.waypoints.len(),
        batch.fallback_count
    );

    let route = if request.optimize {
        Some(state.router.optimize(batch.waypoints.clone()).await)
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(MapResponse { batch, route }))
}
