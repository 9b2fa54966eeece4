use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::error::{AppError, Result};
use crate::models::{
    Author, ChangePasswordRequest, ProfileRow, SignupRequest, SignupRole, UpdateProfileRequest,
    User,
};

pub async fn get_user_by_id(db: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

/// Login lookup: the identifier may be either the username or the email.
pub async fn get_user_by_username_or_email(db: &PgPool, identifier: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1 OR email = $1")
        .bind(identifier)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn get_author_by_user(db: &PgPool, user_id: Uuid) -> Result<Option<Author>> {
    let author = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(author)
}

/// Creates the user with an empty profile, plus an author record when the
/// account is registered as a blogger. One transaction, so no user ever
/// exists without its profile.
pub async fn signup(db: &PgPool, request: &SignupRequest) -> Result<User> {
    let username_taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(&request.username)
            .fetch_one(db)
            .await?;
    if username_taken {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let email_taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&request.email)
            .fetch_one(db)
            .await?;
    if email_taken {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let bio = match request.role {
        SignupRole::Bloggers => match request.bio.as_deref() {
            Some(bio) if !bio.trim().is_empty() => Some(bio),
            _ => {
                return Err(AppError::Validation(
                    "Bio is required for bloggers".to_string(),
                ));
            }
        },
        SignupRole::Readers => None,
    };

    let password_hash = hash_password(&request.password)?;
    let user_id = Uuid::new_v4();

    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, first_name, last_name,
                           is_staff, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, NOW(), NOW())
        "#,
    )
    .bind(user_id)
    .bind(&request.username)
    .bind(&request.email)
    .bind(&password_hash)
    .bind(request.first_name.as_deref())
    .bind(request.last_name.as_deref())
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO profiles (id, user_id, created_at, updated_at) VALUES ($1, $2, NOW(), NOW())",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    if let Some(bio) = bio {
        sqlx::query("INSERT INTO authors (id, user_id, bio, created_at) VALUES ($1, $2, $3, NOW())")
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(bio)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve created user".to_string()))
}

pub async fn change_password(
    db: &PgPool,
    user_id: Uuid,
    request: &ChangePasswordRequest,
) -> Result<()> {
    let user = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::Authentication("User not found".to_string()))?;

    if !verify_password(&request.old_password, &user.password_hash)? {
        return Err(AppError::Validation("Old password is incorrect".to_string()));
    }

    let new_hash = hash_password(&request.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(&new_hash)
        .bind(user_id)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn get_profile_row(db: &PgPool, user_id: Uuid) -> Result<Option<ProfileRow>> {
    let row = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT u.id, u.username, u.first_name, u.last_name,
               p.telegram_id, p.photo, a.bio, u.created_at
        FROM users u
        JOIN profiles p ON p.user_id = u.id
        LEFT JOIN authors a ON a.user_id = u.id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn update_profile(
    db: &PgPool,
    user_id: Uuid,
    request: &UpdateProfileRequest,
) -> Result<ProfileRow> {
    let mut tx = db.begin().await?;

    sqlx::query(
        r#"
        UPDATE users
        SET first_name = COALESCE($1, first_name),
            last_name = COALESCE($2, last_name),
            updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(request.first_name.as_deref())
    .bind(request.last_name.as_deref())
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE profiles
        SET telegram_id = COALESCE($1, telegram_id), updated_at = NOW()
        WHERE user_id = $2
        "#,
    )
    .bind(request.telegram_id.as_deref())
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    if let Some(bio) = request.bio.as_deref() {
        let result = sqlx::query("UPDATE authors SET bio = $1 WHERE user_id = $2")
            .bind(bio)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::Validation("Only bloggers have a bio".to_string()));
        }
    }

    tx.commit().await?;

    get_profile_row(db, user_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve updated profile".to_string()))
}

pub async fn set_profile_photo(db: &PgPool, user_id: Uuid, photo_path: &str) -> Result<()> {
    sqlx::query("UPDATE profiles SET photo = $1, updated_at = NOW() WHERE user_id = $2")
        .bind(photo_path)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn count_user_posts(db: &PgPool, user_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM posts p
        JOIN authors a ON p.author_id = a.id
        WHERE a.user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(count)
}
