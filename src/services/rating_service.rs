use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{RatingTarget, Vote, VoteOutcome};

/// Next stored value and outcome for a requested vote against the current
/// row state. Repeating a vote neutralizes it; anything else stores the
/// requested value.
pub fn transition(existing: Option<Vote>, requested: Vote) -> (Vote, VoteOutcome) {
    match existing {
        None => (requested, VoteOutcome::Created),
        Some(current) if current == requested => (Vote::Neutral, VoteOutcome::Removed),
        Some(_) => (requested, VoteOutcome::Changed),
    }
}

/// Success message for the API surface, matching the web UI wording.
pub fn success_message(target: RatingTarget, requested: Vote, outcome: VoteOutcome) -> String {
    let name = target.display_name();
    match outcome {
        VoteOutcome::Removed => {
            let kind = match requested {
                Vote::Like => "Like",
                Vote::Dislike => "Dislike",
                Vote::Neutral => "Vote",
            };
            format!("{} from {} removed successfully", kind, name.to_lowercase())
        }
        VoteOutcome::Created | VoteOutcome::Changed => match requested {
            Vote::Like => format!("{} liked successfully", name),
            Vote::Dislike => format!("{} disliked successfully", name),
            Vote::Neutral => format!("{} vote reset successfully", name),
        },
    }
}

fn rating_table(target: RatingTarget) -> (&'static str, &'static str) {
    match target {
        RatingTarget::Post(_) => ("post_ratings", "post_id"),
        RatingTarget::Comment(_) => ("comment_ratings", "comment_id"),
    }
}

async fn target_exists(db: &PgPool, target: RatingTarget) -> Result<bool> {
    let sql = match target {
        RatingTarget::Post(_) => "SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)",
        RatingTarget::Comment(_) => "SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1)",
    };
    let exists: bool = sqlx::query_scalar(sql)
        .bind(target.id())
        .fetch_one(db)
        .await?;
    Ok(exists)
}

/// Applies one toggle request. The read and the upsert run in one
/// transaction with the existing row locked, so two racing identical
/// requests still leave exactly one row and a deterministic outcome.
pub async fn apply_vote(
    db: &PgPool,
    owner_id: Uuid,
    target: RatingTarget,
    requested: Vote,
) -> Result<VoteOutcome> {
    if !target_exists(db, target).await? {
        return Err(AppError::NotFound(target.not_found_message().to_string()));
    }

    let (table, column) = rating_table(target);

    let mut tx = db.begin().await?;

    let select = format!(
        "SELECT vote FROM {} WHERE {} = $1 AND owner_id = $2 FOR UPDATE",
        table, column
    );
    let existing: Option<Vote> = sqlx::query_scalar(&select)
        .bind(target.id())
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

    let (next, outcome) = transition(existing, requested);

    let upsert = format!(
        r#"
        INSERT INTO {} (id, owner_id, {}, vote, created_at, updated_at)
        VALUES ($1, $2, $3, $4, NOW(), NOW())
        ON CONFLICT (owner_id, {}) DO UPDATE SET vote = EXCLUDED.vote, updated_at = NOW()
        "#,
        table, column, column
    );
    sqlx::query(&upsert)
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(target.id())
        .bind(next)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(outcome)
}

/// Seeds the author's NEUTRAL rating row when a post or comment is created.
/// Runs inside the caller's transaction so the entity never exists without
/// its row.
pub async fn create_neutral_rating(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: Uuid,
    target: RatingTarget,
) -> Result<()> {
    let (table, column) = rating_table(target);
    let sql = format!(
        r#"
        INSERT INTO {} (id, owner_id, {}, vote, created_at, updated_at)
        VALUES ($1, $2, $3, $4, NOW(), NOW())
        "#,
        table, column
    );
    sqlx::query(&sql)
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(target.id())
        .bind(Vote::Neutral)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// The viewer's stored vote for a target, if any row exists.
pub async fn get_vote(db: &PgPool, owner_id: Uuid, target: RatingTarget) -> Result<Option<Vote>> {
    let (table, column) = rating_table(target);
    let sql = format!(
        "SELECT vote FROM {} WHERE {} = $1 AND owner_id = $2",
        table, column
    );
    let vote: Option<Vote> = sqlx::query_scalar(&sql)
        .bind(target.id())
        .bind(owner_id)
        .fetch_optional(db)
        .await?;
    Ok(vote)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_vote_creates() {
        assert_eq!(
            transition(None, Vote::Like),
            (Vote::Like, VoteOutcome::Created)
        );
        assert_eq!(
            transition(None, Vote::Dislike),
            (Vote::Dislike, VoteOutcome::Created)
        );
    }

    #[test]
    fn repeated_vote_neutralizes() {
        assert_eq!(
            transition(Some(Vote::Like), Vote::Like),
            (Vote::Neutral, VoteOutcome::Removed)
        );
        assert_eq!(
            transition(Some(Vote::Dislike), Vote::Dislike),
            (Vote::Neutral, VoteOutcome::Removed)
        );
    }

    #[test]
    fn opposite_vote_changes() {
        assert_eq!(
            transition(Some(Vote::Like), Vote::Dislike),
            (Vote::Dislike, VoteOutcome::Changed)
        );
        assert_eq!(
            transition(Some(Vote::Dislike), Vote::Like),
            (Vote::Like, VoteOutcome::Changed)
        );
    }

    #[test]
    fn vote_from_neutral_changes() {
        assert_eq!(
            transition(Some(Vote::Neutral), Vote::Like),
            (Vote::Like, VoteOutcome::Changed)
        );
        assert_eq!(
            transition(Some(Vote::Neutral), Vote::Dislike),
            (Vote::Dislike, VoteOutcome::Changed)
        );
    }

    #[test]
    fn double_toggle_is_idempotent() {
        // LIKE then LIKE again always lands on NEUTRAL from any start.
        for start in [None, Some(Vote::Neutral), Some(Vote::Dislike)] {
            let (after_first, _) = transition(start, Vote::Like);
            let (after_second, outcome) = transition(Some(after_first), Vote::Like);
            assert_eq!(after_second, Vote::Neutral);
            assert_eq!(outcome, VoteOutcome::Removed);
        }
    }

    #[test]
    fn messages_match_web_ui_wording() {
        let post = RatingTarget::Post(Uuid::new_v4());
        let comment = RatingTarget::Comment(Uuid::new_v4());

        assert_eq!(
            success_message(post, Vote::Like, VoteOutcome::Created),
            "Post liked successfully"
        );
        assert_eq!(
            success_message(post, Vote::Dislike, VoteOutcome::Changed),
            "Post disliked successfully"
        );
        assert_eq!(
            success_message(post, Vote::Like, VoteOutcome::Removed),
            "Like from post removed successfully"
        );
        assert_eq!(
            success_message(comment, Vote::Dislike, VoteOutcome::Removed),
            "Dislike from comment removed successfully"
        );
        assert_eq!(
            success_message(comment, Vote::Like, VoteOutcome::Created),
            "Comment liked successfully"
        );
    }
}
