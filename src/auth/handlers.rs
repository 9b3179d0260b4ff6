use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        extractors::AuthUser,
        repo_types::User,
        services,
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let Json(payload) = payload?;
    let out = services::register(state.users.as_ref(), &state.jwt, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registration successful".into(),
            token: out.token,
            user: out.user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    let out = services::login(state.users.as_ref(), &state.jwt, payload).await?;
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token: out.token,
        user: out.user,
    }))
}

#[instrument(skip(state, claims), fields(user_id = %claims.id))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<User>, AppError> {
    let user = services::get_self(state.users.as_ref(), &claims).await?;
    Ok(Json(user))
}

#[cfg(test)]
mod me_tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn me_response_omits_password_hash() {
        let user = User {
            id: uuid::Uuid::new_v4(),
            email: "ash@pokemon.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            pseudo: "Sacha".to_string(),
            created_at: OffsetDateTime::now_utc(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["email"], "ash@pokemon.com");
        assert_eq!(json["pseudo"], "Sacha");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
    }
}
