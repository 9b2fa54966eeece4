use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result, conflict_on_unique};
use crate::models::{SubscriptionTarget, User};

const ALREADY_SUBSCRIBED: &str = "You already subscribed";
const NO_SUBSCRIPTION: &str = "Subscription does not exist";

// (relation table, owner column, target column, target table)
fn subscription_tables(
    target: SubscriptionTarget,
) -> (&'static str, &'static str, &'static str, &'static str) {
    match target {
        SubscriptionTarget::User(_) => {
            ("user_subscriptions", "follower_id", "followed_id", "users")
        }
        SubscriptionTarget::Category(_) => (
            "category_subscriptions",
            "user_id",
            "category_id",
            "categories",
        ),
    }
}

async fn relation_exists(db: &PgPool, user_id: Uuid, target: SubscriptionTarget) -> Result<bool> {
    let (table, owner_col, target_col, _) = subscription_tables(target);
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1 AND {} = $2)",
        table, owner_col, target_col
    );
    let exists: bool = sqlx::query_scalar(&sql)
        .bind(user_id)
        .bind(target.id())
        .fetch_one(db)
        .await?;
    Ok(exists)
}

async fn target_exists(db: &PgPool, target: SubscriptionTarget) -> Result<bool> {
    let (_, _, _, target_table) = subscription_tables(target);
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", target_table);
    let exists: bool = sqlx::query_scalar(&sql)
        .bind(target.id())
        .fetch_one(db)
        .await?;
    Ok(exists)
}

/// Creates the subscription row. Duplicate relation reports a conflict,
/// a missing target reports which kind of object was not found. A racing
/// duplicate insert lands on the unique pair constraint and surfaces as
/// the same conflict.
pub async fn subscribe(db: &PgPool, user_id: Uuid, target: SubscriptionTarget) -> Result<()> {
    if let SubscriptionTarget::User(followed_id) = target {
        if followed_id == user_id {
            return Err(AppError::Validation(
                "You cannot subscribe to yourself".to_string(),
            ));
        }
    }

    if relation_exists(db, user_id, target).await? {
        return Err(AppError::Conflict(ALREADY_SUBSCRIBED.to_string()));
    }
    if !target_exists(db, target).await? {
        return Err(AppError::NotFound(target.not_found_message().to_string()));
    }

    let (table, owner_col, target_col, _) = subscription_tables(target);
    let sql = format!(
        "INSERT INTO {} (id, {}, {}, created_at) VALUES ($1, $2, $3, NOW())",
        table, owner_col, target_col
    );
    sqlx::query(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(target.id())
        .execute(db)
        .await
        .map_err(|e| conflict_on_unique(e, ALREADY_SUBSCRIBED))?;

    Ok(())
}

/// Removes the subscription row. When nothing was deleted, a second
/// lookup decides whether the target itself or just the relation was
/// missing, so the caller gets an accurate message.
pub async fn unsubscribe(db: &PgPool, user_id: Uuid, target: SubscriptionTarget) -> Result<()> {
    let (table, owner_col, target_col, _) = subscription_tables(target);
    let sql = format!(
        "DELETE FROM {} WHERE {} = $1 AND {} = $2",
        table, owner_col, target_col
    );
    let result = sqlx::query(&sql)
        .bind(user_id)
        .bind(target.id())
        .execute(db)
        .await?;

    if result.rows_affected() > 0 {
        return Ok(());
    }

    if !target_exists(db, target).await? {
        return Err(AppError::NotFound(target.not_found_message().to_string()));
    }
    Err(AppError::NotFound(NO_SUBSCRIPTION.to_string()))
}

pub async fn get_followers(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT u.* FROM users u
        JOIN user_subscriptions us ON us.follower_id = u.id
        WHERE us.followed_id = $1
        ORDER BY us.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(users)
}

pub async fn get_following(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT u.* FROM users u
        JOIN user_subscriptions us ON us.followed_id = u.id
        WHERE us.follower_id = $1
        ORDER BY us.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(users)
}

pub async fn count_followers(db: &PgPool, user_id: Uuid) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_subscriptions WHERE followed_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await?;
    Ok(count)
}

pub async fn count_following(db: &PgPool, user_id: Uuid) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_subscriptions WHERE follower_id = $1")
            .bind(user_id)
            .fetch_one(db)
            .await?;
    Ok(count)
}
