use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    error::{AppError, Result},
    models::{PostOrdering, SubscriptionTarget, UpdateProfileRequest, UserResponse},
    services::{
        post_service::{self, PostScope, TEXT_PREVIEW_CHARS},
        subscription_service, upload_service, user_service,
    },
};

#[derive(Debug, Deserialize)]
pub struct ProfilePostsQuery {
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn get_current_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>> {
    let profile = user_service::get_profile_row(&state.db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Such user does not exist".to_string()))?;

    let posts_count = user_service::count_user_posts(&state.db, auth_user.user_id).await?;
    let followers_count = subscription_service::count_followers(&state.db, auth_user.user_id).await?;
    let following_count = subscription_service::count_following(&state.db, auth_user.user_id).await?;

    Ok(Json(json!({
        "profile": profile,
        "posts_count": posts_count,
        "followers_count": followers_count,
        "following_count": following_count
    })))
}

/// Public profile page: profile fields, counts and the owner's recent
/// posts (short page, truncated text).
pub async fn get_user_profile(
    State(state): State<AppState>,
    auth_user: OptionalAuthUser,
    Path(user_id): Path<Uuid>,
    Query(params): Query<ProfilePostsQuery>,
) -> Result<Json<Value>> {
    let profile = user_service::get_profile_row(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Such user does not exist".to_string()))?;

    let posts_count = user_service::count_user_posts(&state.db, user_id).await?;
    let followers_count = subscription_service::count_followers(&state.db, user_id).await?;
    let following_count = subscription_service::count_following(&state.db, user_id).await?;

    let viewer_id = auth_user.0.as_ref().map(|user| user.user_id);
    let page = params.page.unwrap_or(1).max(1);
    let limit = state.config.profile_posts_page_size;
    let offset = (page as i64 - 1) * limit;

    let mut posts = post_service::list_posts(
        &state.db,
        viewer_id,
        PostScope::ByProfile(user_id),
        None,
        PostOrdering::default(),
        limit,
        offset,
    )
    .await?;
    for post in &mut posts {
        post.text = post_service::truncate_text(&post.text, TEXT_PREVIEW_CHARS);
    }

    Ok(Json(json!({
        "profile": profile,
        "posts_count": posts_count,
        "followers_count": followers_count,
        "following_count": following_count,
        "posts": posts,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": posts_count,
            "pages": (posts_count + limit - 1) / limit
        }
    })))
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Value>> {
    payload.validate()?;

    let profile = user_service::update_profile(&state.db, auth_user.user_id, &payload).await?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "profile": profile
    })))
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let mut file_data: Vec<u8> = Vec::new();
    let mut content_type = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let declared = field.content_type().map(|mime| mime.to_string());
        let filename = field.file_name().map(|name| name.to_string());
        content_type =
            upload_service::resolve_content_type(declared.as_deref(), filename.as_deref());
        file_data = field.bytes().await?.to_vec();
        break;
    }

    if file_data.is_empty() {
        return Err(AppError::Validation("No file provided".to_string()));
    }
    if file_data.len() > state.config.max_file_size {
        return Err(AppError::ContentTooLarge);
    }
    let mime = content_type.ok_or(AppError::UnsupportedMediaType)?;
    if !upload_service::is_allowed_avatar_type(&mime) {
        return Err(AppError::UnsupportedMediaType);
    }

    let photo = upload_service::store_avatar(&state.config, auth_user.user_id, &file_data).await?;
    user_service::set_profile_photo(&state.db, auth_user.user_id, &photo).await?;

    tracing::debug!(user_id = %auth_user.user_id, path = %photo, "avatar stored");

    Ok(Json(json!({
        "message": "Avatar uploaded successfully",
        "photo": photo
    })))
}

pub async fn subscribe_to_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>)> {
    subscription_service::subscribe(
        &state.db,
        auth_user.user_id,
        SubscriptionTarget::User(user_id),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": "You successfully subscribed"
        })),
    ))
}

pub async fn unsubscribe_from_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode> {
    subscription_service::unsubscribe(
        &state.db,
        auth_user.user_id,
        SubscriptionTarget::User(user_id),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_followers(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Value>> {
    user_service::get_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Such user does not exist".to_string()))?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).min(100) as i64;
    let offset = (page as i64 - 1) * limit;

    let followers = subscription_service::get_followers(&state.db, user_id, limit, offset).await?;
    let followers: Vec<UserResponse> = followers.into_iter().map(Into::into).collect();
    let total = subscription_service::count_followers(&state.db, user_id).await?;

    Ok(Json(json!({
        "followers": followers,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total + limit - 1) / limit
        }
    })))
}

pub async fn get_following(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Value>> {
    user_service::get_user_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Such user does not exist".to_string()))?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(20).min(100) as i64;
    let offset = (page as i64 - 1) * limit;

    let following = subscription_service::get_following(&state.db, user_id, limit, offset).await?;
    let following: Vec<UserResponse> = following.into_iter().map(Into::into).collect();
    let total = subscription_service::count_following(&state.db, user_id).await?;

    Ok(Json(json!({
        "following": following,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total + limit - 1) / limit
        }
    })))
}
