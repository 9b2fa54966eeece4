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
    models::{CreateCommentRequest, RatingTarget, UpdateCommentRequest, Vote, VoteOutcome},
    services::{comment_service, rating_service, user_service},
};

#[derive(Debug, Deserialize)]
pub struct GetCommentsQuery {
    pub page: Option<u32>,
    pub is_my: Option<bool>,
}

/// Comment tree for a post, root comments paginated. `is_my=true`
/// narrows the flat set to the viewer's own comments before assembly.
pub async fn get_post_comments(
    State(state): State<AppState>,
    auth_user: OptionalAuthUser,
    Path(post_id): Path<Uuid>,
    Query(params): Query<GetCommentsQuery>,
) -> Result<Json<Value>> {
    let viewer_id = auth_user.0.as_ref().map(|user| user.user_id);

    let owner_filter = if params.is_my.unwrap_or(false) {
        let viewer = viewer_id.ok_or_else(|| {
            AppError::Authentication("Authentication required to filter own comments".to_string())
        })?;
        Some(viewer)
    } else {
        None
    };

    let comments =
        comment_service::list_post_comments(&state.db, post_id, viewer_id, owner_filter).await?;
    if comments.is_empty() {
        return Err(AppError::NotFound("Comments not found".to_string()));
    }

    let tree = comment_service::build_comment_tree(comments, state.config.replies_display_limit);

    let page = params.page.unwrap_or(1).max(1) as usize;
    let limit = state.config.comments_page_size;
    let total = tree.len();
    let comments: Vec<_> = tree.into_iter().skip((page - 1) * limit).take(limit).collect();

    Ok(Json(json!({
        "comments": comments,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": total.div_ceil(limit)
        }
    })))
}

pub async fn create_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    payload.validate()?;

    let comment =
        comment_service::create_comment(&state.db, post_id, auth_user.user_id, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Comment created successfully",
            "comment": comment
        })),
    ))
}

async fn can_modify_comment(
    state: &AppState,
    owner_id: Uuid,
    auth_user: &AuthUser,
) -> Result<bool> {
    if owner_id == auth_user.user_id {
        return Ok(true);
    }
    let user = user_service::get_user_by_id(&state.db, auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;
    Ok(user.is_staff)
}

pub async fn update_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<Value>> {
    payload.validate()?;

    let comment = comment_service::get_comment_by_id(&state.db, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment does not exist".to_string()))?;

    if !can_modify_comment(&state, comment.owner_id, &auth_user).await? {
        return Err(AppError::Authorization(
            "Can only edit your own comments".to_string(),
        ));
    }

    let comment = comment_service::update_comment(&state.db, comment_id, &payload).await?;

    Ok(Json(json!({
        "message": "Comment updated successfully",
        "comment": comment
    })))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let comment = comment_service::get_comment_by_id(&state.db, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment does not exist".to_string()))?;

    if !can_modify_comment(&state, comment.owner_id, &auth_user).await? {
        return Err(AppError::Authorization(
            "Can only delete your own comments".to_string(),
        ));
    }

    comment_service::delete_comment(&state.db, comment_id).await?;

    Ok(Json(json!({
        "message": "Comment deleted successfully"
    })))
}

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

pub async fn like_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>)> {
    vote_response(
        &state,
        auth_user.user_id,
        RatingTarget::Comment(comment_id),
        Vote::Like,
    )
    .await
}

pub async fn dislike_comment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(comment_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Value>)> {
    vote_response(
        &state,
        auth_user.user_id,
        RatingTarget::Comment(comment_id),
        Vote::Dislike,
    )
    .await
}
