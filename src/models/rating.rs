use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored vote value. Maps to SMALLINT in the rating tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[repr(i16)]
pub enum Vote {
    Dislike = -1,
    Neutral = 0,
    Like = 1,
}

impl Vote {
    pub fn value(self) -> i16 {
        self as i16
    }
}

impl FromStr for Vote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(Vote::Like),
            "NEUTRAL" => Ok(Vote::Neutral),
            "DISLIKE" => Ok(Vote::Dislike),
            _ => Err(format!("Unknown vote type: {}", s)),
        }
    }
}

impl TryFrom<i16> for Vote {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Vote::Dislike),
            0 => Ok(Vote::Neutral),
            1 => Ok(Vote::Like),
            _ => Err(format!("Unknown vote value: {}", value)),
        }
    }
}

/// What a toggle call did to the rating row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Created,
    Changed,
    Removed,
}

/// The entity a rating row points at. One toggle routine serves both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTarget {
    Post(Uuid),
    Comment(Uuid),
}

impl RatingTarget {
    pub fn id(&self) -> Uuid {
        match self {
            RatingTarget::Post(id) | RatingTarget::Comment(id) => *id,
        }
    }

    /// Display name used in success messages ("Post liked successfully").
    pub fn display_name(&self) -> &'static str {
        match self {
            RatingTarget::Post(_) => "Post",
            RatingTarget::Comment(_) => "Comment",
        }
    }

    pub fn not_found_message(&self) -> &'static str {
        match self {
            RatingTarget::Post(_) => "Post does not exist",
            RatingTarget::Comment(_) => "Comment does not exist",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostRating {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub post_id: Uuid,
    pub vote: Vote,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CommentRating {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub comment_id: Uuid,
    pub vote: Vote,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_tokens_parse() {
        assert_eq!("LIKE".parse::<Vote>().unwrap(), Vote::Like);
        assert_eq!("NEUTRAL".parse::<Vote>().unwrap(), Vote::Neutral);
        assert_eq!("DISLIKE".parse::<Vote>().unwrap(), Vote::Dislike);
        assert!("like".parse::<Vote>().is_err());
        assert!("UPVOTE".parse::<Vote>().is_err());
    }

    #[test]
    fn vote_values_round_trip() {
        for vote in [Vote::Dislike, Vote::Neutral, Vote::Like] {
            assert_eq!(Vote::try_from(vote.value()).unwrap(), vote);
        }
        assert!(Vote::try_from(2i16).is_err());
    }
}
