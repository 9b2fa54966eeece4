use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    CreatePostRequest, Post, PostOrdering, PostWithMeta, RatingTarget, UpdatePostRequest,
};
use crate::services::rating_service;

/// Which posts a listing covers. `Feed` and `Favorites` are per-viewer,
/// `ByProfile` is the profile owner's published posts.
#[derive(Debug, Clone, Copy)]
pub enum PostScope {
    All,
    Feed(Uuid),
    Favorites(Uuid),
    ByProfile(Uuid),
}

/// List views carry a shortened `text`; detail views carry the full body.
pub const TEXT_PREVIEW_CHARS: usize = 100;

/// Shortens list-view text to `limit` characters with a trailing ellipsis.
pub fn truncate_text(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let truncated: String = text.chars().take(limit).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}

const POST_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.text,
        p.author_id, au.username AS author_username,
        p.category_id, cat.title AS category_title,
        COALESCE((SELECT SUM(pr2.vote) FROM post_ratings pr2
                  WHERE pr2.post_id = p.id), 0)::BIGINT AS rating,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
        (SELECT COUNT(*) FROM favorites fc WHERE fc.post_id = p.id) AS favorites_count,
        CASE WHEN $1::UUID IS NULL THEN NULL
             ELSE COALESCE(pr.vote, 0)::INT2 END AS my_vote,
        CASE WHEN $1::UUID IS NULL THEN NULL
             ELSE (fv.id IS NOT NULL) END AS my_favorite,
        p.created_at, p.updated_at
    FROM posts p
    JOIN authors a ON p.author_id = a.id
    JOIN users au ON a.user_id = au.id
    JOIN categories cat ON p.category_id = cat.id
    LEFT JOIN post_ratings pr ON pr.post_id = p.id AND pr.owner_id = $1::UUID
    LEFT JOIN favorites fv ON fv.post_id = p.id AND fv.user_id = $1::UUID
    WHERE TRUE
"#;

fn scope_clause(scope: PostScope, param: usize) -> Option<String> {
    match scope {
        PostScope::All => None,
        PostScope::Feed(_) => Some(format!(
            r#" AND (
                EXISTS (SELECT 1 FROM user_subscriptions us
                        JOIN authors fa ON fa.user_id = us.followed_id
                        WHERE us.follower_id = ${param} AND fa.id = p.author_id)
                OR EXISTS (SELECT 1 FROM category_subscriptions cs
                           WHERE cs.user_id = ${param} AND cs.category_id = p.category_id)
            )"#
        )),
        PostScope::Favorites(_) => Some(format!(
            " AND EXISTS (SELECT 1 FROM favorites sf WHERE sf.post_id = p.id AND sf.user_id = ${param})"
        )),
        PostScope::ByProfile(_) => Some(format!(" AND a.user_id = ${param}")),
    }
}

fn scope_user(scope: PostScope) -> Option<Uuid> {
    match scope {
        PostScope::All => None,
        PostScope::Feed(user_id)
        | PostScope::Favorites(user_id)
        | PostScope::ByProfile(user_id) => Some(user_id),
    }
}

pub async fn list_posts(
    db: &PgPool,
    viewer_id: Option<Uuid>,
    scope: PostScope,
    category_title: Option<&str>,
    ordering: PostOrdering,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostWithMeta>> {
    let mut query = POST_SELECT.to_string();
    let mut param_count = 1;

    if category_title.is_some() {
        param_count += 1;
        query.push_str(&format!(" AND cat.title = ${}", param_count));
    }

    if let Some(clause) = scope_clause(scope, param_count + 1) {
        param_count += 1;
        query.push_str(&clause);
    }

    query.push_str(&format!(
        " ORDER BY {} LIMIT ${} OFFSET ${}",
        ordering.order_clause(),
        param_count + 1,
        param_count + 2
    ));

    let mut query_builder = sqlx::query_as::<_, PostWithMeta>(&query).bind(viewer_id);
    if let Some(title) = category_title {
        query_builder = query_builder.bind(title);
    }
    if let Some(user_id) = scope_user(scope) {
        query_builder = query_builder.bind(user_id);
    }

    let posts = query_builder.bind(limit).bind(offset).fetch_all(db).await?;
    Ok(posts)
}

pub async fn count_posts(
    db: &PgPool,
    scope: PostScope,
    category_title: Option<&str>,
) -> Result<i64> {
    let mut query = r#"
        SELECT COUNT(*)
        FROM posts p
        JOIN authors a ON p.author_id = a.id
        JOIN categories cat ON p.category_id = cat.id
        WHERE TRUE
    "#
    .to_string();
    let mut param_count = 0;

    if category_title.is_some() {
        param_count += 1;
        query.push_str(&format!(" AND cat.title = ${}", param_count));
    }

    if let Some(clause) = scope_clause(scope, param_count + 1) {
        query.push_str(&clause);
    }

    let mut query_builder = sqlx::query_scalar::<_, i64>(&query);
    if let Some(title) = category_title {
        query_builder = query_builder.bind(title);
    }
    if let Some(user_id) = scope_user(scope) {
        query_builder = query_builder.bind(user_id);
    }

    let count = query_builder.fetch_one(db).await?;
    Ok(count)
}

pub async fn get_post_by_id_raw(db: &PgPool, post_id: Uuid) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(db)
        .await?;
    Ok(post)
}

pub async fn get_post_with_meta(
    db: &PgPool,
    post_id: Uuid,
    viewer_id: Option<Uuid>,
) -> Result<Option<PostWithMeta>> {
    let query = format!("{} AND p.id = $2", POST_SELECT);
    let post = sqlx::query_as::<_, PostWithMeta>(&query)
        .bind(viewer_id)
        .bind(post_id)
        .fetch_optional(db)
        .await?;
    Ok(post)
}

/// Creates the post together with the author's NEUTRAL rating row, in one
/// transaction. `owner_id` is the author's user id (rating rows reference
/// users, posts reference author records).
pub async fn create_post(
    db: &PgPool,
    owner_id: Uuid,
    author_id: Uuid,
    request: &CreatePostRequest,
) -> Result<Post> {
    let category_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
            .bind(request.category_id)
            .fetch_one(db)
            .await?;
    if !category_exists {
        return Err(AppError::NotFound("There is no such category".to_string()));
    }

    let post_id = Uuid::new_v4();

    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO posts (id, author_id, category_id, title, text, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(request.category_id)
    .bind(&request.title)
    .bind(&request.text)
    .execute(&mut *tx)
    .await?;

    rating_service::create_neutral_rating(&mut tx, owner_id, RatingTarget::Post(post_id)).await?;

    tx.commit().await?;

    get_post_by_id_raw(db, post_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve created post".to_string()))
}

pub async fn update_post(db: &PgPool, post_id: Uuid, request: &UpdatePostRequest) -> Result<Post> {
    if let Some(category_id) = request.category_id {
        let category_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)")
                .bind(category_id)
                .fetch_one(db)
                .await?;
        if !category_exists {
            return Err(AppError::NotFound("There is no such category".to_string()));
        }
    }

    sqlx::query(
        r#"
        UPDATE posts
        SET title = COALESCE($1, title),
            text = COALESCE($2, text),
            category_id = COALESCE($3, category_id),
            updated_at = NOW()
        WHERE id = $4
        "#,
    )
    .bind(request.title.as_deref())
    .bind(request.text.as_deref())
    .bind(request.category_id)
    .bind(post_id)
    .execute(db)
    .await?;

    get_post_by_id_raw(db, post_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve updated post".to_string()))
}

pub async fn delete_post(db: &PgPool, post_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(db)
        .await?;
    Ok(())
}

async fn post_exists(db: &PgPool, post_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
        .bind(post_id)
        .fetch_one(db)
        .await?;
    Ok(exists)
}

/// Returns true when a new favorite row was created, false when the post
/// was already in the viewer's favorites.
pub async fn add_favorite(db: &PgPool, user_id: Uuid, post_id: Uuid) -> Result<bool> {
    if !post_exists(db, post_id).await? {
        return Err(AppError::NotFound("Post does not exist".to_string()));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO favorites (id, user_id, post_id, created_at)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (user_id, post_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(post_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn remove_favorite(db: &PgPool, user_id: Uuid, post_id: Uuid) -> Result<()> {
    if !post_exists(db, post_id).await? {
        return Err(AppError::NotFound("Post does not exist".to_string()));
    }

    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND post_id = $2")
        .bind(user_id)
        .bind(post_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Post is not in favorites".to_string()));
    }
    Ok(())
}

/// Flips favorite membership; returns true when the post ended up
/// favorited. Used by the redirect surface.
pub async fn toggle_favorite(db: &PgPool, user_id: Uuid, post_id: Uuid) -> Result<bool> {
    if add_favorite(db, user_id, post_id).await? {
        return Ok(true);
    }
    remove_favorite(db, user_id, post_id).await?;
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_text("short", 100), "short");
    }

    #[test]
    fn exact_limit_is_untouched() {
        let text = "x".repeat(100);
        assert_eq!(truncate_text(&text, 100), text);
    }

    #[test]
    fn long_text_is_cut_with_ellipsis() {
        let text = "y".repeat(120);
        let truncated = truncate_text(&text, 100);
        assert_eq!(truncated.chars().count(), 103);
        assert!(truncated.ends_with("..."));
        assert!(truncated.starts_with(&"y".repeat(100)));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "ю".repeat(101);
        let truncated = truncate_text(&text, 100);
        assert_eq!(truncated.chars().count(), 103);
    }
}
