use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{
    Comment, CommentNode, CommentWithMeta, CreateCommentRequest, RatingTarget,
    UpdateCommentRequest,
};
use crate::services::rating_service;

/// Groups an already-fetched, already-ordered flat comment list into a
/// forest of root nodes. Children keep the input order; each node carries
/// its full child count and the children beyond `reply_limit` in
/// `replies_more`. A reply whose parent is not in the input is dropped.
pub fn build_comment_tree(comments: Vec<CommentWithMeta>, reply_limit: usize) -> Vec<CommentNode> {
    let mut children: HashMap<Uuid, Vec<CommentWithMeta>> = HashMap::new();
    let mut roots: Vec<CommentWithMeta> = Vec::new();

    for comment in comments {
        match comment.reply_to {
            Some(parent_id) => children.entry(parent_id).or_default().push(comment),
            None => roots.push(comment),
        }
    }

    roots
        .into_iter()
        .map(|root| attach_replies(root, &mut children, reply_limit))
        .collect()
}

fn attach_replies(
    comment: CommentWithMeta,
    children: &mut HashMap<Uuid, Vec<CommentWithMeta>>,
    reply_limit: usize,
) -> CommentNode {
    let direct = children.remove(&comment.id).unwrap_or_default();
    let replies_count = direct.len();

    let mut replies_list: Vec<CommentNode> = direct
        .into_iter()
        .map(|child| attach_replies(child, children, reply_limit))
        .collect();
    let replies_more = replies_list.split_off(reply_limit.min(replies_list.len()));

    CommentNode {
        comment,
        replies_count,
        replies_list,
        replies_more,
    }
}

pub async fn get_comment_by_id(db: &PgPool, comment_id: Uuid) -> Result<Option<Comment>> {
    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(db)
        .await?;
    Ok(comment)
}

/// Flat comments for a post, newest first, with rating sums and the
/// viewer's vote. `owner_filter` restricts to one owner's comments.
pub async fn list_post_comments(
    db: &PgPool,
    post_id: Uuid,
    viewer_id: Option<Uuid>,
    owner_filter: Option<Uuid>,
) -> Result<Vec<CommentWithMeta>> {
    let mut query = r#"
        SELECT
            c.id, c.post_id, c.owner_id, u.username AS owner_username,
            c.reply_to, c.text,
            COALESCE((SELECT SUM(cr2.vote) FROM comment_ratings cr2
                      WHERE cr2.comment_id = c.id), 0)::BIGINT AS rating,
            CASE WHEN $2::UUID IS NULL THEN NULL
                 ELSE COALESCE(cr.vote, 0)::INT2 END AS my_vote,
            c.created_at, c.updated_at
        FROM comments c
        JOIN users u ON c.owner_id = u.id
        LEFT JOIN comment_ratings cr ON cr.comment_id = c.id AND cr.owner_id = $2::UUID
        WHERE c.post_id = $1
    "#
    .to_string();

    if owner_filter.is_some() {
        query.push_str(" AND c.owner_id = $3");
    }
    query.push_str(" ORDER BY c.created_at DESC");

    let mut query_builder = sqlx::query_as::<_, CommentWithMeta>(&query)
        .bind(post_id)
        .bind(viewer_id);
    if let Some(owner_id) = owner_filter {
        query_builder = query_builder.bind(owner_id);
    }

    let comments = query_builder.fetch_all(db).await?;
    Ok(comments)
}

/// Creates the comment together with its author-owned NEUTRAL rating row.
/// A reply must point at a comment on the same post.
pub async fn create_comment(
    db: &PgPool,
    post_id: Uuid,
    owner_id: Uuid,
    request: &CreateCommentRequest,
) -> Result<Comment> {
    let post_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
        .bind(post_id)
        .fetch_one(db)
        .await?;
    if !post_exists {
        return Err(AppError::NotFound("Post does not exist".to_string()));
    }

    if let Some(reply_to) = request.reply_to {
        let parent = get_comment_by_id(db, reply_to)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment does not exist".to_string()))?;
        if parent.post_id != post_id {
            return Err(AppError::Validation(
                "Reply must reference a comment on the same post".to_string(),
            ));
        }
    }

    let comment_id = Uuid::new_v4();

    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO comments (id, post_id, owner_id, reply_to, text, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
        "#,
    )
    .bind(comment_id)
    .bind(post_id)
    .bind(owner_id)
    .bind(request.reply_to)
    .bind(&request.text)
    .execute(&mut *tx)
    .await?;

    rating_service::create_neutral_rating(&mut tx, owner_id, RatingTarget::Comment(comment_id))
        .await?;

    tx.commit().await?;

    get_comment_by_id(db, comment_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve created comment".to_string()))
}

pub async fn update_comment(
    db: &PgPool,
    comment_id: Uuid,
    request: &UpdateCommentRequest,
) -> Result<Comment> {
    sqlx::query("UPDATE comments SET text = $1, updated_at = NOW() WHERE id = $2")
        .bind(&request.text)
        .bind(comment_id)
        .execute(db)
        .await?;

    get_comment_by_id(db, comment_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve updated comment".to_string()))
}

pub async fn delete_comment(db: &PgPool, comment_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(db)
        .await?;
    Ok(())
}
