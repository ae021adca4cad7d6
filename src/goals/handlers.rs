use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateGoalRequest, UpdateGoalRequest},
    repo_types::Goal,
    services,
};
use crate::{auth::extractors::AuthUser, error::AppResult, state::AppState};

pub fn goal_routes() -> Router<AppState> {
    Router::new()
        .route("/goals", post(create_goal))
        .route(
            "/goals/:id",
            get(get_goal).patch(update_goal).delete(delete_goal),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_goal(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateGoalRequest>,
) -> AppResult<(StatusCode, Json<Goal>)> {
    let goal = services::create_goal(&state, &identity, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

#[instrument(skip(state))]
pub async fn get_goal(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Goal>> {
    Ok(Json(services::get_goal(&state, &identity, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_goal(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateGoalRequest>,
) -> AppResult<Json<Goal>> {
    Ok(Json(
        services::update_goal(&state, &identity, id, payload.into()).await?,
    ))
}

#[instrument(skip(state))]
pub async fn delete_goal(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    services::delete_goal(&state, &identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
