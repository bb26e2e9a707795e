use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::ApiError;
use crate::models::waypoint::Waypoint;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    pub waypoints: Vec<Waypoint>,
}

/*
    POST /api/route/optimize
*/
pub async fn optimize(
    body: web::Json<OptimizeRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let waypoints = body.into_inner().waypoints;
    if waypoints
        .iter()
        .any(|w| !w.lat.is_finite() || !w.lng.is_finite())
    {
        return Err(ApiError::InvalidRequest(
            "waypoint coordinates must be finite numbers".to_string(),
        ));
    }

    let route = state.router.optimize(waypoints).await;
    Ok(HttpResponse::Ok().json(route))
}
