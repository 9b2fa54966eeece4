use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, Claims, verify_password},
    error::{AppError, Result},
    models::{ChangePasswordRequest, LoginRequest, SignupRequest, UserResponse},
    services::user_service,
};

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let user = user_service::signup(&state.db, &payload).await?;

    let (token, claims) = Claims::new(
        user.id,
        user.username.clone(),
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )?;

    state
        .redis
        .store_session(
            &claims.jti,
            &user.id.to_string(),
            (state.config.jwt_expiry_hours * 3600) as u64,
        )
        .await?;

    tracing::info!(user = %user.username, "new user signed up");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "token": token,
            "user": UserResponse::from(user)
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let user = user_service::get_user_by_username_or_email(&state.db, &payload.username_or_email)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Authentication("Invalid credentials".to_string()));
    }

    let (token, claims) = Claims::new(
        user.id,
        user.username.clone(),
        &state.config.jwt_secret,
        state.config.jwt_expiry_hours,
    )?;

    state
        .redis
        .store_session(
            &claims.jti,
            &user.id.to_string(),
            (state.config.jwt_expiry_hours * 3600) as u64,
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Login successful",
            "token": token,
            "user": UserResponse::from(user)
        })),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<(StatusCode, Json<Value>)> {
    state.redis.delete_session(&auth_user.jti).await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Logout successful"
        })),
    ))
}

pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode> {
    payload.validate()?;

    user_service::change_password(&state.db, auth_user.user_id, &payload).await?;

    Ok(StatusCode::NO_CONTENT)
}
