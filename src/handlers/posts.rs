use axum::{
    extract::{Path, Query, State},
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
    models::{
        CreatePostRequest, Post, PostOrdering, RatingTarget, UpdatePostRequest, Vote, VoteOutcome,
    },
    services::{
        comment_service,
        post_service::{self, PostScope, TEXT_PREVIEW_CHARS},
        rating_service, user_service,
    },
};

#[derive(Debug, Deserialize)]
pub struct GetPostsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub ordering: Option<String>,
}

fn parse_ordering(raw: Option<&str>) -> Result<PostOrdering> {
    match raw {
        None => Ok(PostOrdering::default()),
        Some(value) => value
            .parse()
            .map_err(|_| AppError::Validation(format!("Unknown ordering: {}", value))),
    }
}

/// Shared list shape for the public listing, the feed and the favorites
/// views. Only the scope differs.
async fn list_response(
    state: &AppState,
    viewer_id: Option<Uuid>,
    scope: PostScope,
    params: GetPostsQuery,
) -> Result<Json<Value>> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .map(|limit| (limit as i64).min(100))
        .unwrap_or(state.config.posts_page_size);
    let offset = (page as i64 - 1) * limit;
    let ordering = parse_ordering(params.ordering.as_deref())?;

    let mut posts = post_service::list_posts(
        &state.db,
        viewer_id,
        scope,
        params.category.as_deref(),
        ordering,
        limit,
        offset,
    )
    .await?;
    for post in &mut posts {
        post.text = post_service::truncate_text(&post.text, TEXT_PREVIEW_CHARS);
    }

    let total = post_service::count_posts(&state.db, scope, params.category.as_deref()).await?;

    Ok(Json(json!({
        "posts": posts,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": (total + limit - 1) / limit
        }
    })))
}

pub async fn get_posts(
    State(state): State<AppState>,
    auth_user: OptionalAuthUser,
    Query(params): Query<GetPostsQuery>,
) -> Result<Json<Value>> {
    let viewer_id = auth_user.0.as_ref().map(|user| user.user_id);
    list_response(&state, viewer_id, PostScope::All, params).await
}

/// Posts from authors and categories the viewer subscribes to.
pub async fn get_feed(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<GetPostsQuery>,
) -> Result<Json<Value>> {
    list_response(
        &state,
        Some(auth_user.user_id),
        PostScope::Feed(auth_user.user_id),
        params,
    )
    .await
}

pub async fn get_favorite_posts(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<GetPostsQuery>,
) -> Result<Json<Value>> {
    list_response(
        &state,
        Some(auth_user.user_id),
        PostScope::Favorites(auth_user.user_id),
        params,
    )
    .await
}

/// Post detail with full text and the first page of the comment tree.
pub async fn get_post(
    State(state): State<AppState>,
    auth_user: OptionalAuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let viewer_id = auth_user.0.as_ref().map(|user| user.user_id);

    let post = post_service::get_post_with_meta(&state.db, post_id, viewer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post does not exist".to_string()))?;

    let comments = comment_service::list_post_comments(&state.db, post_id, viewer_id, None).await?;
    let tree = comment_service::build_comment_tree(comments, state.config.replies_display_limit);
    let comments: Vec<_> = tree
        .into_iter()
        .take(state.config.comments_page_size)
        .collect();

    Ok(Json(json!({
        "post": post,
        "comments": comments
    })))
}

pub async fn create_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let author = user_service::get_author_by_user(&state.db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::Authorization("Only bloggers can create posts".to_string()))?;

    let post = post_service::create_post(&state.db, auth_user.user_id, author.id, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Post created successfully",
            "post": post
        })),
    ))
}

/// Owner via the author record, or staff.
async fn can_modify_post(state: &AppState, post: &Post, auth_user: &AuthUser) -> Result<bool> {
    if let Some(author) = user_service::get_author_by_user(&state.db, auth_user.user_id).await? {
        if author.id == post.author_id {
            return Ok(true);
        }
    }
    let user = user_service::get_user_by_id(&state.db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;
    Ok(user.is_staff)
}

pub async fn update_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Value>> {
    payload.validate()?;

    let post = post_service::get_post_by_id_raw(&state.db, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post does not exist".to_string()))?;

    if !can_modify_post(&state, &post, &auth_user).await? {
        return Err(AppError::Authorization(
            "Can only edit your own posts".to_string(),
        ));
    }

    let post = post_service::update_post(&state.db, post_id, &payload).await?;

    Ok(Json(json!({
        "message": "Post updated successfully",
        "post": post
    })))
}

pub async fn delete_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let post = post_service::get_post_by_id_raw(&state.db, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post does not exist".to_string()))?;

    if !can_modify_post(&state, &post, &auth_user).await? {
        return Err(AppError::Authorization(
            "Can only delete your own posts".to_string(),
        ));
    }

    post_service::delete_post(&state.db, post_id).await?;

    Ok(Json(json!({
        "message": "Post deleted successfully"
    })))
}

/// 201 when a new rating row was created, 200 for a change or removal.
async fn vote_response(
    state: &AppState,
    user_id: Uuid,
    target: RatingTarget,
    requested: Vote,
) -> Result<(StatusCode, Json<Value>)> {
    let outcome = rating_service::apply_vote(&state.db, user_id, target, requested).await?;
    let status = match outcome {
        VoteOutcome::Created => StatusCode::CREATED,
        VoteOutcome::Changed | VoteOutcome::Removed => StatusCode::OK,
    };

    Ok((
        status,
        Json(json!({
            "success": rating_service::success_message(target, requested, outcome)
        })),
    ))
}

pub async fn like_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>)> {
    vote_response(
        &state,
        auth_user.user_id,
        RatingTarget::Post(post_id),
        Vote::Like,
    )
    .await
}

pub async fn dislike_post(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>)> {
    vote_response(
        &state,
        auth_user.user_id,
        RatingTarget::Post(post_id),
        Vote::Dislike,
    )
    .await
}

pub async fn add_favorite(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>)> {
    let created = post_service::add_favorite(&state.db, auth_user.user_id, post_id).await?;

    if created {
        Ok((
            StatusCode::CREATED,
            Json(json!({ "message": "Post added to favorites!" })),
        ))
    } else {
        Ok((
            StatusCode::OK,
            Json(json!({ "message": "Post already in favorites." })),
        ))
    }
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Value>> {
    post_service::remove_favorite(&state.db, auth_user.user_id, post_id).await?;

    Ok(Json(json!({ "message": "Post removed from favorites!" })))
}
