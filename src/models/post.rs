use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// Create post request
#[derive(Debug, Validate, Deserialize)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub text: String,
    pub category_id: Uuid,
}

// Update post request
#[derive(Debug, Validate, Deserialize)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub text: Option<String>,
    pub category_id: Option<Uuid>,
}

/// Post with aggregates and per-viewer fields, as returned by list and
/// detail queries. `my_vote`/`my_favorite` are null for anonymous viewers.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PostWithMeta {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub author_id: Uuid,
    pub author_username: String,
    pub category_id: Uuid,
    pub category_title: String,
    pub rating: i64,
    pub comments_count: i64,
    pub favorites_count: i64,
    pub my_vote: Option<i16>,
    pub my_favorite: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whitelisted sort keys for post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrdering {
    Rating,
    RatingDesc,
    CreatedAt,
    #[default]
    CreatedAtDesc,
}

impl PostOrdering {
    pub fn order_clause(self) -> &'static str {
        match self {
            PostOrdering::Rating => "rating ASC, p.created_at DESC",
            PostOrdering::RatingDesc => "rating DESC, p.created_at DESC",
            PostOrdering::CreatedAt => "p.created_at ASC",
            PostOrdering::CreatedAtDesc => "p.created_at DESC",
        }
    }
}

impl FromStr for PostOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rating" => Ok(PostOrdering::Rating),
            "-rating" => Ok(PostOrdering::RatingDesc),
            "created_at" => Ok(PostOrdering::CreatedAt),
            "-created_at" => Ok(PostOrdering::CreatedAtDesc),
            _ => Err(format!("Unknown ordering: {}", s)),
        }
    }
}
