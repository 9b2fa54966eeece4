use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result, conflict_on_unique};
use crate::models::{Category, CategoryResponse, CreateCategoryRequest};
use crate::redis::{CATEGORY_CACHE_KEY, RedisClient};

/// Full category list, served from the Redis cache when warm. A cache
/// entry that no longer deserializes is treated as a miss.
pub async fn list_categories(
    db: &PgPool,
    redis: &RedisClient,
    cache_ttl_secs: u64,
) -> Result<Vec<CategoryResponse>> {
    if let Some(cached) = redis.cache_get(CATEGORY_CACHE_KEY).await? {
        if let Ok(categories) = serde_json::from_str::<Vec<CategoryResponse>>(&cached) {
            return Ok(categories);
        }
    }

    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY title")
        .fetch_all(db)
        .await?;
    let responses: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();

    let serialized = serde_json::to_string(&responses)
        .map_err(|e| AppError::Internal(format!("Failed to serialize categories: {}", e)))?;
    redis
        .cache_set(CATEGORY_CACHE_KEY, &serialized, cache_ttl_secs)
        .await?;

    Ok(responses)
}

pub async fn create_category(
    db: &PgPool,
    redis: &RedisClient,
    request: &CreateCategoryRequest,
) -> Result<Category> {
    let category_id = Uuid::new_v4();
    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (id, title, created_at)
        VALUES ($1, $2, NOW())
        RETURNING *
        "#,
    )
    .bind(category_id)
    .bind(&request.title)
    .fetch_one(db)
    .await
    .map_err(|e| conflict_on_unique(e, "Category with this title already exists"))?;

    redis.cache_delete(CATEGORY_CACHE_KEY).await?;
    tracing::info!(category = %category.title, "category created, cache invalidated");

    Ok(category)
}
