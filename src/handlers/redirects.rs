//! Browser-facing action endpoints. Each performs its side effect and
//! answers `303 See Other` back to `next` (or `/`), so a plain link or
//! form in a rendered page can drive votes, favorites and subscriptions.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, Result},
    models::{RatingTarget, SubscriptionTarget, Vote},
    services::{post_service, rating_service, subscription_service},
};

#[derive(Debug, Deserialize)]
pub struct VoteParams {
    pub vote_type: String,
    pub comment_id: Option<Uuid>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteParams {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeParams {
    pub action: String,
    pub next: Option<String>,
}

fn back_to(next: Option<&str>) -> Redirect {
    Redirect::to(next.unwrap_or("/"))
}

/// `GET /vote/{post_id}?vote_type=LIKE|DISLIKE|NEUTRAL[&comment_id=..]`.
/// With `comment_id` the vote lands on that comment instead of the post.
pub async fn vote(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
    Query(params): Query<VoteParams>,
) -> Result<Redirect> {
    let requested: Vote = params
        .vote_type
        .parse()
        .map_err(|_| AppError::Validation(format!("Unknown vote type: {}", params.vote_type)))?;

    let target = match params.comment_id {
        Some(comment_id) => RatingTarget::Comment(comment_id),
        None => RatingTarget::Post(post_id),
    };

    rating_service::apply_vote(&state.db, auth_user.user_id, target, requested).await?;

    Ok(back_to(params.next.as_deref()))
}

/// `GET /favorite/{post_id}` flips favorite membership.
pub async fn favorite(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(post_id): Path<Uuid>,
    Query(params): Query<FavoriteParams>,
) -> Result<Redirect> {
    post_service::toggle_favorite(&state.db, auth_user.user_id, post_id).await?;

    Ok(back_to(params.next.as_deref()))
}

/// `GET /subscribe/{object_type}/{object_id}?action=subscribe|unsubscribe`
/// where `object_type` is `user` or `category`.
pub async fn subscribe(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((object_type, object_id)): Path<(String, Uuid)>,
    Query(params): Query<SubscribeParams>,
) -> Result<Redirect> {
    let target = match object_type.as_str() {
        "user" => SubscriptionTarget::User(object_id),
        "category" => SubscriptionTarget::Category(object_id),
        _ => {
            return Err(AppError::Validation(format!(
                "Unknown subscription object: {}",
                object_type
            )));
        }
    };

    match params.action.as_str() {
        "subscribe" => {
            subscription_service::subscribe(&state.db, auth_user.user_id, target).await?
        }
        "unsubscribe" => {
            subscription_service::unsubscribe(&state.db, auth_user.user_id, target).await?
        }
        _ => {
            return Err(AppError::Validation(format!(
                "Unknown action: {}",
                params.action
            )));
        }
    }

    Ok(back_to(params.next.as_deref()))
}
