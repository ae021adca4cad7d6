use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, LoginRequest, PublicUser, RegisterRequest, RegisterResponse,
            ResetPasswordRequest, TokenResponse, UpdateEmailRequest, UpdatePasswordRequest,
        },
        extractors::AuthUser,
        services,
    },
    error::AppResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/authentication/user", post(register))
        .route("/authentication/token", post(create_token))
        .route("/authentication/forgot-password", post(forgot_password))
        .route("/authentication/reset-password", post(reset_password))
        .route("/users/activate/:token", put(activate))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_me))
        .route("/users/me/email", patch(update_email))
        .route("/users/me/password", patch(update_password))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let reg =
        services::register(&state, &payload.username, &payload.email, &payload.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: reg.user.into(),
            token: reg.invitation_secret,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<StatusCode> {
    services::activate(&state, &token).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn create_token(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let (token, _user) =
        services::issue_auth_token(&state, &payload.email, &payload.password).await?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<StatusCode> {
    services::request_password_reset(&state, &payload.email).await?;
    Ok(StatusCode::ACCEPTED)
}

#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    services::consume_password_reset(&state, &payload.token, &payload.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = services::get_me(&state, &identity).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_email(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<UpdateEmailRequest>,
) -> AppResult<Json<PublicUser>> {
    let user =
        services::update_email(&state, &identity, &payload.email, &payload.current_password)
            .await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> AppResult<StatusCode> {
    services::update_password(
        &state,
        &identity,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        auth_routes().merge(me_routes()).with_state(AppState::fake())
    }

    #[tokio::test]
    async fn register_rejects_invalid_email_with_400() {
        let res = app()
            .oneshot(
                Request::post("/authentication/user")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"username":"alice","email":"nope","password":"pw123456"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_requires_a_token() {
        let res = app()
            .oneshot(Request::get("/users/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_with_malformed_email_is_invalid_credentials() {
        let res = app()
            .oneshot(
                Request::post("/authentication/token")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"nope","password":"pw123456"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
