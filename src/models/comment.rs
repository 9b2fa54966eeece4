use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub owner_id: Uuid,
    pub reply_to: Option<Uuid>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Validate, Deserialize)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    pub reply_to: Option<Uuid>,
}

#[derive(Debug, Validate, Deserialize)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
}

/// Comment with its rating sum and the viewer's own vote, as fetched for
/// listing. `my_vote` is null for anonymous viewers.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentWithMeta {
    pub id: Uuid,
    pub post_id: Uuid,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub reply_to: Option<Uuid>,
    pub text: String,
    pub rating: i64,
    pub my_vote: Option<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One node of the rendered comment forest. `replies_list` holds the first
/// few replies (display cap), `replies_more` the rest; `replies_count` is
/// all immediate children. Built per request, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: CommentWithMeta,
    pub replies_count: usize,
    pub replies_list: Vec<CommentNode>,
    pub replies_more: Vec<CommentNode>,
}
