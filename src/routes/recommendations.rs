use actix_web::{web, HttpResponse};

use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::recommendation::{NewRecommendation, RecommendationFilters};
use crate::services::recommendation_service::templates;
use crate::state::AppState;

/*
    GET /api/recommendations?search=&location=&duration=&budget=&season=&travelStyle=&tags=&sortBy=
*/
pub async fn list(
    filters: web::Query<RecommendationFilters>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let recommendations = state.recommendations.search(&filters).await?;
    Ok(HttpResponse::Ok().json(recommendations))
}

/*
    POST /api/recommendations
*/
pub async fn create(
    body: web::Json<NewRecommendation>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let recommendation = state.recommendations.add(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(recommendation))
}

/*
    GET /api/recommendations/facets
*/
pub async fn facets(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.recommendations.facets().await?))
}

/*
    POST /api/recommendations/{id}/like (protected)
*/
pub async fn like(
    path: web::Path<String>,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let recommendation = state
        .recommendations
        .like(&path.into_inner(), &user.user_id)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "id": recommendation.id,
        "likes": recommendation.likes,
        "liked": recommendation.liked_by.contains(&user.user_id),
    })))
}

/*
    POST /api/recommendations/{id}/use/{key}
*/
pub async fn use_recommendation(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (id, key) = path.into_inner();
    state.sequencer.begin(&key);
    let stored = state.recommendations.use_in_plan(&id, &key).await?;
    Ok(HttpResponse::Ok().json(stored))
}

/*
    GET /api/templates
*/
pub async fn list_templates() -> HttpResponse {
    HttpResponse::Ok().json(templates())
}

/*
    POST /api/templates/{id}/use/{key}
*/
pub async fn use_template(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (id, key) = path.into_inner();
    state.sequencer.begin(&key);
    let stored = state.recommendations.use_template(&id, &key).await?;
    Ok(HttpResponse::Ok().json(stored))
}
