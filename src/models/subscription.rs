use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSubscription {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategorySubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The entity a subscription points at. One toggle routine serves both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionTarget {
    User(Uuid),
    Category(Uuid),
}

impl SubscriptionTarget {
    pub fn id(&self) -> Uuid {
        match self {
            SubscriptionTarget::User(id) | SubscriptionTarget::Category(id) => *id,
        }
    }

    pub fn not_found_message(&self) -> &'static str {
        match self {
            SubscriptionTarget::User(_) => "Such user does not exist",
            SubscriptionTarget::Category(_) => "There is no such category",
        }
    }
}
