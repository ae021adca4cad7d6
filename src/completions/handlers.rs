use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{parse_date, MarkCompleteRequest, RangeQuery},
    repo_types::HabitCompletion,
    services,
};
use crate::{auth::extractors::AuthUser, error::AppResult, state::AppState};

pub fn completion_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/habits/:id/completions",
            post(mark_complete).get(list_completions),
        )
        .route("/habits/:id/completions/:date", delete(unmark_complete))
}

#[instrument(skip(state, payload))]
pub async fn mark_complete(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(habit_id): Path<i64>,
    payload: Result<Json<MarkCompleteRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<HabitCompletion>)> {
    let Json(payload) = payload?;
    let completion = services::mark_complete(&state, &identity, habit_id, payload.date).await?;
    Ok((StatusCode::CREATED, Json(completion)))
}

#[instrument(skip(state))]
pub async fn list_completions(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(habit_id): Path<i64>,
    Query(range): Query<RangeQuery>,
) -> AppResult<Json<Vec<HabitCompletion>>> {
    Ok(Json(
        services::list_completions(&state, &identity, habit_id, range.from, range.to).await?,
    ))
}

#[instrument(skip(state))]
pub async fn unmark_complete(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path((habit_id, date)): Path<(i64, String)>,
) -> AppResult<StatusCode> {
    let date = parse_date(&date)?;
    services::unmark_complete(&state, &identity, habit_id, date).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    async fn echo_date(
        payload: Result<Json<MarkCompleteRequest>, JsonRejection>,
    ) -> AppResult<String> {
        let Json(payload) = payload?;
        Ok(payload.date.to_string())
    }

    async fn send(body: &'static str, content_type: Option<&str>) -> StatusCode {
        let app = Router::new().route("/mark", post(echo_date));
        let mut req = Request::post("/mark");
        if let Some(ct) = content_type {
            req = req.header("content-type", ct);
        }
        app.oneshot(req.body(Body::from(body)).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn bad_completion_bodies_are_bad_requests() {
        let json = Some("application/json");
        assert_eq!(send(r#"{"date":"2025-02-03"}"#, json).await, StatusCode::OK);
        assert_eq!(send(r#"{"date":"03/02/2025"}"#, json).await, StatusCode::BAD_REQUEST);
        assert_eq!(send(r#"{}"#, json).await, StatusCode::BAD_REQUEST);
        assert_eq!(send(r#"{"date":"#, json).await, StatusCode::BAD_REQUEST);
        assert_eq!(send(r#"{"date":"2025-02-03"}"#, None).await, StatusCode::BAD_REQUEST);
    }
}
