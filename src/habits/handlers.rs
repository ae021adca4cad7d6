use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateHabitRequest, UpdateHabitRequest},
    repo_types::Habit,
    services,
};
use crate::{auth::extractors::AuthUser, error::AppResult, state::AppState};

pub fn habit_routes() -> Router<AppState> {
    Router::new()
        .route("/habits", post(create_habit))
        .route(
            "/habits/:id",
            get(get_habit).patch(update_habit).delete(delete_habit),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_habit(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateHabitRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<Habit>)> {
    let habit = services::create_habit(&state, &identity, payload.into()).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/v1/habits/{}", habit.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(habit)))
}

#[instrument(skip(state))]
pub async fn get_habit(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Habit>> {
    Ok(Json(services::get_habit(&state, &identity, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_habit(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateHabitRequest>,
) -> AppResult<Json<Habit>> {
    Ok(Json(
        services::update_habit(&state, &identity, id, payload.into()).await?,
    ))
}

#[instrument(skip(state))]
pub async fn delete_habit(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    services::delete_habit(&state, &identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
