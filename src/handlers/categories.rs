use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, Result},
    models::{CategoryResponse, CreateCategoryRequest, SubscriptionTarget},
    services::{category_service, subscription_service, user_service},
};

pub async fn get_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>> {
    let categories = category_service::list_categories(
        &state.db,
        &state.redis,
        state.config.category_cache_ttl_secs,
    )
    .await?;

    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let user = user_service::get_user_by_id(&state.db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;
    if !user.is_staff {
        return Err(AppError::Authorization(
            "Only staff can create categories".to_string(),
        ));
    }

    let category = category_service::create_category(&state.db, &state.redis, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Category created successfully",
            "category": CategoryResponse::from(category)
        })),
    ))
}

pub async fn subscribe_to_category(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>)> {
    subscription_service::subscribe(
        &state.db,
        auth_user.user_id,
        SubscriptionTarget::Category(category_id),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": "You successfully subscribed"
        })),
    ))
}

pub async fn unsubscribe_from_category(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode> {
    subscription_service::unsubscribe(
        &state.db,
        auth_user.user_id,
        SubscriptionTarget::Category(category_id),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
