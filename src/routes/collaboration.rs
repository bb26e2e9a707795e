use actix_web::{web, HttpResponse};

use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::collaboration::{NewCollaborator, NewComment, NewPoll, VoteRequest};
use crate::state::AppState;

/*
    GET /api/collaboration/{key}
*/
pub async fn get_board(path: web::Path<String>, state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.collaboration.board(&path.into_inner(), None))
}

/*
    POST /api/collaboration/{key}/comments (protected)
*/
pub async fn add_comment(
    path: web::Path<String>,
    user: AuthenticatedUser,
    body: web::Json<NewComment>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let comment = state.collaboration.add_comment(
        &path.into_inner(),
        &user.participant(),
        body.into_inner(),
    )?;
    Ok(HttpResponse::Created().json(comment))
}

/*
    POST /api/collaboration/{key}/polls (protected)
*/
pub async fn create_poll(
    path: web::Path<String>,
    user: AuthenticatedUser,
    body: web::Json<NewPoll>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let poll = state.collaboration.create_poll(
        &path.into_inner(),
        &user.participant(),
        body.into_inner(),
    )?;
    Ok(HttpResponse::Created().json(poll))
}

/*
    POST /api/collaboration/{key}/polls/{poll_id}/vote (protected)
*/
pub async fn vote(
    path: web::Path<(String, String)>,
    user: AuthenticatedUser,
    body: web::Json<VoteRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (key, poll_id) = path.into_inner();
    let poll = state.collaboration.vote(
        &key,
        &poll_id,
        &user.participant(),
        &body.into_inner().option_id,
    )?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "totalVotes": poll.total_votes(),
        "hasVoted": poll.has_voted(&user.user_id),
        "percentages": poll
            .options
            .iter()
            .map(|o| (o.id.clone(), poll.percentage(&o.id)))
            .collect::<std::collections::HashMap<_, _>>(),
        "poll": poll,
    })))
}

/*
    POST /api/collaboration/{key}/polls/{poll_id}/close (protected)
*/
pub async fn close_poll(
    path: web::Path<(String, String)>,
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let (key, poll_id) = path.into_inner();
    let poll = state
        .collaboration
        .close_poll(&key, &poll_id, &user.participant())?;
    Ok(HttpResponse::Ok().json(poll))
}

/*
    POST /api/collaboration/{key}/collaborators (protected)
*/
pub async fn invite(
    path: web::Path<String>,
    user: AuthenticatedUser,
    body: web::Json<NewCollaborator>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let collaborator = state.collaboration.invite(
        &path.into_inner(),
        &user.participant(),
        body.into_inner(),
    )?;
    Ok(HttpResponse::Created().json(collaborator))
}
