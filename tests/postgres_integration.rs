//! Integration tests for the service layer against a real PostgreSQL
//! database. The SQLx test macro provisions one isolated database per
//! test and applies `./migrations` before the body runs.
//!
//! Run with: `cargo test --test postgres_integration`

use blogr::error::AppError;
use blogr::models::{
    CreateCommentRequest, CreatePostRequest, PostOrdering, RatingTarget, SignupRequest,
    SignupRole, SubscriptionTarget, Vote, VoteOutcome,
};
use blogr::services::{
    comment_service,
    post_service::{self, PostScope},
    rating_service, subscription_service, user_service,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn make_user(pool: &PgPool, username: &str) -> Uuid {
    let user_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, 'not-a-real-hash')",
    )
    .bind(user_id)
    .bind(username)
    .bind(format!("{}@example.com", username))
    .execute(pool)
    .await
    .unwrap();

    sqlx::query("INSERT INTO profiles (id, user_id) VALUES ($1, $2)")
        .bind(Uuid::new_v4())
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();

    user_id
}

/// Returns `(user_id, author_id)`.
async fn make_blogger(pool: &PgPool, username: &str) -> (Uuid, Uuid) {
    let user_id = make_user(pool, username).await;
    let author_id = Uuid::new_v4();
    sqlx::query("INSERT INTO authors (id, user_id, bio) VALUES ($1, $2, 'writes here')")
        .bind(author_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
    (user_id, author_id)
}

async fn make_category(pool: &PgPool, title: &str) -> Uuid {
    let category_id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, title) VALUES ($1, $2)")
        .bind(category_id)
        .bind(title)
        .execute(pool)
        .await
        .unwrap();
    category_id
}

/// Inserts the post row directly, without the service-side rating seed.
async fn make_post(pool: &PgPool, author_id: Uuid, category_id: Uuid, title: &str) -> Uuid {
    let post_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO posts (id, author_id, category_id, title, text) VALUES ($1, $2, $3, $4, 'body text')",
    )
    .bind(post_id)
    .bind(author_id)
    .bind(category_id)
    .bind(title)
    .execute(pool)
    .await
    .unwrap();
    post_id
}

async fn make_comment(
    pool: &PgPool,
    post_id: Uuid,
    owner_id: Uuid,
    reply_to: Option<Uuid>,
) -> Uuid {
    let comment_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO comments (id, post_id, owner_id, reply_to, text) VALUES ($1, $2, $3, $4, 'a comment')",
    )
    .bind(comment_id)
    .bind(post_id)
    .bind(owner_id)
    .bind(reply_to)
    .execute(pool)
    .await
    .unwrap();
    comment_id
}

async fn stored_post_vote(pool: &PgPool, owner_id: Uuid, post_id: Uuid) -> Option<i16> {
    sqlx::query_scalar("SELECT vote FROM post_ratings WHERE owner_id = $1 AND post_id = $2")
        .bind(owner_id)
        .bind(post_id)
        .fetch_optional(pool)
        .await
        .unwrap()
}

fn signup_request(username: &str, role: SignupRole, bio: Option<&str>) -> SignupRequest {
    SignupRequest {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: "long enough password".to_string(),
        first_name: None,
        last_name: None,
        role,
        bio: bio.map(|bio| bio.to_string()),
    }
}

// ============================================================================
// Accounts
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn signup_blogger_creates_profile_and_author(pool: PgPool) {
    let user = user_service::signup(
        &pool,
        &signup_request("wordsmith", SignupRole::Bloggers, Some("I write")),
    )
    .await
    .unwrap();

    let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(profiles, 1);

    let author = user_service::get_author_by_user(&pool, user.id)
        .await
        .unwrap()
        .expect("blogger should get an author record");
    assert_eq!(author.bio, "I write");
    assert!(!user.is_staff);
}

#[sqlx::test(migrations = "./migrations")]
async fn signup_reader_has_no_author(pool: PgPool) {
    let user = user_service::signup(
        &pool,
        &signup_request("lurker", SignupRole::Readers, None),
    )
    .await
    .unwrap();

    let author = user_service::get_author_by_user(&pool, user.id).await.unwrap();
    assert!(author.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn signup_blogger_without_bio_rejected(pool: PgPool) {
    let err = user_service::signup(
        &pool,
        &signup_request("quiet", SignupRole::Bloggers, None),
    )
    .await
    .unwrap_err();

    match err {
        AppError::Validation(message) => assert_eq!(message, "Bio is required for bloggers"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn signup_duplicate_username_conflicts(pool: PgPool) {
    user_service::signup(&pool, &signup_request("taken", SignupRole::Readers, None))
        .await
        .unwrap();

    let mut request = signup_request("taken", SignupRole::Readers, None);
    request.email = "other@example.com".to_string();
    let err = user_service::signup(&pool, &request).await.unwrap_err();

    match err {
        AppError::Conflict(message) => assert_eq!(message, "Username already taken"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn signup_duplicate_email_conflicts(pool: PgPool) {
    user_service::signup(&pool, &signup_request("first", SignupRole::Readers, None))
        .await
        .unwrap();

    let mut request = signup_request("second", SignupRole::Readers, None);
    request.email = "first@example.com".to_string();
    let err = user_service::signup(&pool, &request).await.unwrap_err();

    match err {
        AppError::Conflict(message) => assert_eq!(message, "Email already registered"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn change_password_rejects_wrong_old_password(pool: PgPool) {
    let user = user_service::signup(&pool, &signup_request("cautious", SignupRole::Readers, None))
        .await
        .unwrap();

    let request = blogr::models::ChangePasswordRequest {
        old_password: "not the password".to_string(),
        new_password: "a brand new password".to_string(),
    };
    let err = user_service::change_password(&pool, user.id, &request)
        .await
        .unwrap_err();

    match err {
        AppError::Validation(message) => assert_eq!(message, "Old password is incorrect"),
        other => panic!("unexpected error: {:?}", other),
    }
}

// ============================================================================
// Vote toggle
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn first_like_creates_rating_row(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let voter_id = make_user(&pool, "voter").await;

    let outcome =
        rating_service::apply_vote(&pool, voter_id, RatingTarget::Post(post_id), Vote::Like)
            .await
            .unwrap();

    assert_eq!(outcome, VoteOutcome::Created);
    assert_eq!(stored_post_vote(&pool, voter_id, post_id).await, Some(1));
}

#[sqlx::test(migrations = "./migrations")]
async fn repeated_like_neutralizes_but_keeps_row(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let voter_id = make_user(&pool, "voter").await;

    rating_service::apply_vote(&pool, voter_id, RatingTarget::Post(post_id), Vote::Like)
        .await
        .unwrap();
    let outcome =
        rating_service::apply_vote(&pool, voter_id, RatingTarget::Post(post_id), Vote::Like)
            .await
            .unwrap();

    assert_eq!(outcome, VoteOutcome::Removed);
    // The row survives as NEUTRAL; the toggle never deletes it.
    assert_eq!(stored_post_vote(&pool, voter_id, post_id).await, Some(0));
}

#[sqlx::test(migrations = "./migrations")]
async fn like_then_dislike_changes_stored_vote(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let voter_id = make_user(&pool, "voter").await;

    rating_service::apply_vote(&pool, voter_id, RatingTarget::Post(post_id), Vote::Like)
        .await
        .unwrap();
    let outcome =
        rating_service::apply_vote(&pool, voter_id, RatingTarget::Post(post_id), Vote::Dislike)
            .await
            .unwrap();

    assert_eq!(outcome, VoteOutcome::Changed);
    assert_eq!(stored_post_vote(&pool, voter_id, post_id).await, Some(-1));
}

#[sqlx::test(migrations = "./migrations")]
async fn long_toggle_sequence_keeps_one_row(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let voter_id = make_user(&pool, "voter").await;

    for requested in [Vote::Like, Vote::Like, Vote::Dislike, Vote::Like, Vote::Dislike] {
        rating_service::apply_vote(&pool, voter_id, RatingTarget::Post(post_id), requested)
            .await
            .unwrap();
    }

    let rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM post_ratings WHERE owner_id = $1 AND post_id = $2")
            .bind(voter_id)
            .bind(post_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(stored_post_vote(&pool, voter_id, post_id).await, Some(-1));
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_rating_row_rejected_by_constraint(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let voter_id = make_user(&pool, "voter").await;

    let insert = "INSERT INTO post_ratings (id, owner_id, post_id, vote) VALUES ($1, $2, $3, 1)";
    sqlx::query(insert)
        .bind(Uuid::new_v4())
        .bind(voter_id)
        .bind(post_id)
        .execute(&pool)
        .await
        .unwrap();

    let result = sqlx::query(insert)
        .bind(Uuid::new_v4())
        .bind(voter_id)
        .bind(post_id)
        .execute(&pool)
        .await;

    match result {
        Err(sqlx::Error::Database(db_err)) => assert!(db_err.is_unique_violation()),
        other => panic!("expected unique violation, got {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn vote_on_missing_post_is_not_found(pool: PgPool) {
    let voter_id = make_user(&pool, "voter").await;

    let err =
        rating_service::apply_vote(&pool, voter_id, RatingTarget::Post(Uuid::new_v4()), Vote::Like)
            .await
            .unwrap_err();

    match err {
        AppError::NotFound(message) => assert_eq!(message, "Post does not exist"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn vote_on_missing_comment_is_not_found(pool: PgPool) {
    let voter_id = make_user(&pool, "voter").await;

    let err = rating_service::apply_vote(
        &pool,
        voter_id,
        RatingTarget::Comment(Uuid::new_v4()),
        Vote::Dislike,
    )
    .await
    .unwrap_err();

    match err {
        AppError::NotFound(message) => assert_eq!(message, "Comment does not exist"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn comment_votes_land_in_comment_table(pool: PgPool) {
    let (author_user, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let comment_id = make_comment(&pool, post_id, author_user, None).await;
    let voter_id = make_user(&pool, "voter").await;

    rating_service::apply_vote(&pool, voter_id, RatingTarget::Comment(comment_id), Vote::Like)
        .await
        .unwrap();

    let comment_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comment_ratings")
        .fetch_one(&pool)
        .await
        .unwrap();
    let post_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_ratings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(comment_rows, 1);
    assert_eq!(post_rows, 0);
}

// ============================================================================
// Rating rows seeded at creation
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn creating_post_seeds_author_neutral_rating(pool: PgPool) {
    let (user_id, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;

    let request = CreatePostRequest {
        title: "fresh post".to_string(),
        text: "some body".to_string(),
        category_id,
    };
    let post = post_service::create_post(&pool, user_id, author_id, &request)
        .await
        .unwrap();

    let votes: Vec<(Uuid, i16)> =
        sqlx::query_as("SELECT owner_id, vote FROM post_ratings WHERE post_id = $1")
            .bind(post.id)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(votes, vec![(user_id, 0)]);
}

#[sqlx::test(migrations = "./migrations")]
async fn creating_comment_seeds_owner_neutral_rating(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let commenter_id = make_user(&pool, "commenter").await;

    let request = CreateCommentRequest {
        text: "nice one".to_string(),
        reply_to: None,
    };
    let comment = comment_service::create_comment(&pool, post_id, commenter_id, &request)
        .await
        .unwrap();

    let votes: Vec<(Uuid, i16)> =
        sqlx::query_as("SELECT owner_id, vote FROM comment_ratings WHERE comment_id = $1")
            .bind(comment.id)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(votes, vec![(commenter_id, 0)]);
}

#[sqlx::test(migrations = "./migrations")]
async fn reply_must_reference_same_post(pool: PgPool) {
    let (user_id, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_a = make_post(&pool, author_id, category_id, "post a").await;
    let post_b = make_post(&pool, author_id, category_id, "post b").await;
    let comment_on_b = make_comment(&pool, post_b, user_id, None).await;

    let request = CreateCommentRequest {
        text: "confused reply".to_string(),
        reply_to: Some(comment_on_b),
    };
    let err = comment_service::create_comment(&pool, post_a, user_id, &request)
        .await
        .unwrap_err();

    match err {
        AppError::Validation(message) => {
            assert_eq!(message, "Reply must reference a comment on the same post")
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn post_in_unknown_category_rejected(pool: PgPool) {
    let (user_id, author_id) = make_blogger(&pool, "author").await;

    let request = CreatePostRequest {
        title: "orphan".to_string(),
        text: "text".to_string(),
        category_id: Uuid::new_v4(),
    };
    let err = post_service::create_post(&pool, user_id, author_id, &request)
        .await
        .unwrap_err();

    match err {
        AppError::NotFound(message) => assert_eq!(message, "There is no such category"),
        other => panic!("unexpected error: {:?}", other),
    }
}

// ============================================================================
// Favorites
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn adding_favorite_twice_reports_existing(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let reader_id = make_user(&pool, "reader").await;

    assert!(post_service::add_favorite(&pool, reader_id, post_id).await.unwrap());
    assert!(!post_service::add_favorite(&pool, reader_id, post_id).await.unwrap());

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn removing_missing_favorite_is_not_found(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let reader_id = make_user(&pool, "reader").await;

    let err = post_service::remove_favorite(&pool, reader_id, post_id)
        .await
        .unwrap_err();

    match err {
        AppError::NotFound(message) => assert_eq!(message, "Post is not in favorites"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn toggle_favorite_flips_membership(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let reader_id = make_user(&pool, "reader").await;

    assert!(post_service::toggle_favorite(&pool, reader_id, post_id).await.unwrap());
    assert!(!post_service::toggle_favorite(&pool, reader_id, post_id).await.unwrap());

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM favorites")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

// ============================================================================
// Subscriptions
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_subscription_conflicts(pool: PgPool) {
    let follower_id = make_user(&pool, "follower").await;
    let followed_id = make_user(&pool, "followed").await;

    subscription_service::subscribe(&pool, follower_id, SubscriptionTarget::User(followed_id))
        .await
        .unwrap();
    let err =
        subscription_service::subscribe(&pool, follower_id, SubscriptionTarget::User(followed_id))
            .await
            .unwrap_err();

    match err {
        AppError::Conflict(message) => assert_eq!(message, "You already subscribed"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn self_subscription_rejected(pool: PgPool) {
    let user_id = make_user(&pool, "narcissus").await;

    let err = subscription_service::subscribe(&pool, user_id, SubscriptionTarget::User(user_id))
        .await
        .unwrap_err();

    match err {
        AppError::Validation(message) => assert_eq!(message, "You cannot subscribe to yourself"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn unsubscribe_without_subscription_is_not_found(pool: PgPool) {
    let user_id = make_user(&pool, "user").await;
    let category_id = make_category(&pool, "tech").await;

    let err = subscription_service::unsubscribe(
        &pool,
        user_id,
        SubscriptionTarget::Category(category_id),
    )
    .await
    .unwrap_err();

    match err {
        AppError::NotFound(message) => assert_eq!(message, "Subscription does not exist"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn unsubscribe_from_missing_category_is_not_found(pool: PgPool) {
    let user_id = make_user(&pool, "user").await;

    let err = subscription_service::unsubscribe(
        &pool,
        user_id,
        SubscriptionTarget::Category(Uuid::new_v4()),
    )
    .await
    .unwrap_err();

    match err {
        AppError::NotFound(message) => assert_eq!(message, "There is no such category"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn subscribing_to_missing_user_is_not_found(pool: PgPool) {
    let follower_id = make_user(&pool, "follower").await;

    let err = subscription_service::subscribe(
        &pool,
        follower_id,
        SubscriptionTarget::User(Uuid::new_v4()),
    )
    .await
    .unwrap_err();

    match err {
        AppError::NotFound(message) => assert_eq!(message, "Such user does not exist"),
        other => panic!("unexpected error: {:?}", other),
    }
}

// ============================================================================
// Listings and the personalized feed
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn feed_shows_posts_from_followed_authors(pool: PgPool) {
    let (followed_user, followed_author) = make_blogger(&pool, "followed").await;
    let (_, other_author) = make_blogger(&pool, "other").await;
    let category_id = make_category(&pool, "tech").await;
    let followed_post = make_post(&pool, followed_author, category_id, "from followed").await;
    let other_post = make_post(&pool, other_author, category_id, "from other").await;
    let viewer_id = make_user(&pool, "viewer").await;

    subscription_service::subscribe(&pool, viewer_id, SubscriptionTarget::User(followed_user))
        .await
        .unwrap();

    let feed = post_service::list_posts(
        &pool,
        Some(viewer_id),
        PostScope::Feed(viewer_id),
        None,
        PostOrdering::default(),
        10,
        0,
    )
    .await
    .unwrap();

    let ids: Vec<Uuid> = feed.iter().map(|post| post.id).collect();
    assert!(ids.contains(&followed_post));
    assert!(!ids.contains(&other_post));
}

#[sqlx::test(migrations = "./migrations")]
async fn feed_shows_posts_from_subscribed_categories(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let subscribed_category = make_category(&pool, "rust").await;
    let other_category = make_category(&pool, "cooking").await;
    let in_feed = make_post(&pool, author_id, subscribed_category, "on topic").await;
    let out_of_feed = make_post(&pool, author_id, other_category, "off topic").await;
    let viewer_id = make_user(&pool, "viewer").await;

    subscription_service::subscribe(
        &pool,
        viewer_id,
        SubscriptionTarget::Category(subscribed_category),
    )
    .await
    .unwrap();

    let feed = post_service::list_posts(
        &pool,
        Some(viewer_id),
        PostScope::Feed(viewer_id),
        None,
        PostOrdering::default(),
        10,
        0,
    )
    .await
    .unwrap();

    let ids: Vec<Uuid> = feed.iter().map(|post| post.id).collect();
    assert!(ids.contains(&in_feed));
    assert!(!ids.contains(&out_of_feed));
}

#[sqlx::test(migrations = "./migrations")]
async fn favorites_scope_only_lists_favorited_posts(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let favorited = make_post(&pool, author_id, category_id, "favorited").await;
    let skipped = make_post(&pool, author_id, category_id, "skipped").await;
    let reader_id = make_user(&pool, "reader").await;

    post_service::add_favorite(&pool, reader_id, favorited).await.unwrap();

    let posts = post_service::list_posts(
        &pool,
        Some(reader_id),
        PostScope::Favorites(reader_id),
        None,
        PostOrdering::default(),
        10,
        0,
    )
    .await
    .unwrap();

    let ids: Vec<Uuid> = posts.iter().map(|post| post.id).collect();
    assert!(ids.contains(&favorited));
    assert!(!ids.contains(&skipped));
    assert_eq!(posts.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn viewer_sees_own_vote_and_favorite_flags(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let voter_id = make_user(&pool, "voter").await;
    let bystander_id = make_user(&pool, "bystander").await;

    rating_service::apply_vote(&pool, voter_id, RatingTarget::Post(post_id), Vote::Like)
        .await
        .unwrap();
    post_service::add_favorite(&pool, voter_id, post_id).await.unwrap();

    let seen_by_voter = post_service::get_post_with_meta(&pool, post_id, Some(voter_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen_by_voter.my_vote, Some(1));
    assert_eq!(seen_by_voter.my_favorite, Some(true));
    assert_eq!(seen_by_voter.rating, 1);
    assert_eq!(seen_by_voter.favorites_count, 1);

    // Authenticated but uninvolved: flags present, at rest.
    let seen_by_bystander = post_service::get_post_with_meta(&pool, post_id, Some(bystander_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen_by_bystander.my_vote, Some(0));
    assert_eq!(seen_by_bystander.my_favorite, Some(false));
}

#[sqlx::test(migrations = "./migrations")]
async fn anonymous_viewer_gets_null_flags(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let voter_id = make_user(&pool, "voter").await;

    rating_service::apply_vote(&pool, voter_id, RatingTarget::Post(post_id), Vote::Like)
        .await
        .unwrap();

    let seen_anonymously = post_service::get_post_with_meta(&pool, post_id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(seen_anonymously.my_vote, None);
    assert_eq!(seen_anonymously.my_favorite, None);
    assert_eq!(seen_anonymously.rating, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn rating_sums_likes_and_dislikes(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;

    for username in ["fan_one", "fan_two"] {
        let fan = make_user(&pool, username).await;
        rating_service::apply_vote(&pool, fan, RatingTarget::Post(post_id), Vote::Like)
            .await
            .unwrap();
    }
    let critic = make_user(&pool, "critic").await;
    rating_service::apply_vote(&pool, critic, RatingTarget::Post(post_id), Vote::Dislike)
        .await
        .unwrap();

    let post = post_service::get_post_with_meta(&pool, post_id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(post.rating, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn category_filter_narrows_listing(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let rust_id = make_category(&pool, "rust").await;
    let cooking_id = make_category(&pool, "cooking").await;
    let rust_post = make_post(&pool, author_id, rust_id, "ownership").await;
    make_post(&pool, author_id, cooking_id, "souffle").await;

    let posts = post_service::list_posts(
        &pool,
        None,
        PostScope::All,
        Some("rust"),
        PostOrdering::default(),
        10,
        0,
    )
    .await
    .unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, rust_post);

    let total = post_service::count_posts(&pool, PostScope::All, Some("rust"))
        .await
        .unwrap();
    assert_eq!(total, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn rating_desc_ordering_puts_liked_post_first(pool: PgPool) {
    let (_, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let liked = make_post(&pool, author_id, category_id, "liked").await;
    let ignored = make_post(&pool, author_id, category_id, "ignored").await;
    let fan = make_user(&pool, "fan").await;

    rating_service::apply_vote(&pool, fan, RatingTarget::Post(liked), Vote::Like)
        .await
        .unwrap();

    let posts = post_service::list_posts(
        &pool,
        None,
        PostScope::All,
        None,
        PostOrdering::RatingDesc,
        10,
        0,
    )
    .await
    .unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, liked);
    assert_eq!(posts[1].id, ignored);
}

#[sqlx::test(migrations = "./migrations")]
async fn profile_scope_lists_only_that_authors_posts(pool: PgPool) {
    let (user_a, author_a) = make_blogger(&pool, "author_a").await;
    let (_, author_b) = make_blogger(&pool, "author_b").await;
    let category_id = make_category(&pool, "tech").await;
    let post_a = make_post(&pool, author_a, category_id, "by a").await;
    make_post(&pool, author_b, category_id, "by b").await;

    let posts = post_service::list_posts(
        &pool,
        None,
        PostScope::ByProfile(user_a),
        None,
        PostOrdering::default(),
        10,
        0,
    )
    .await
    .unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, post_a);

    let count = user_service::count_user_posts(&pool, user_a).await.unwrap();
    assert_eq!(count, 1);
}

// ============================================================================
// Comment listings
// ============================================================================

#[sqlx::test(migrations = "./migrations")]
async fn comment_tree_from_db_caps_replies(pool: PgPool) {
    let (user_id, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;

    let root = make_comment(&pool, post_id, user_id, None).await;
    let mut reply_ids = Vec::new();
    for _ in 0..4 {
        reply_ids.push(make_comment(&pool, post_id, user_id, Some(root)).await);
    }

    let flat = comment_service::list_post_comments(&pool, post_id, None, None)
        .await
        .unwrap();
    assert_eq!(flat.len(), 5);

    let tree = comment_service::build_comment_tree(flat, 3);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].comment.id, root);
    assert_eq!(tree[0].replies_count, 4);
    assert_eq!(tree[0].replies_list.len(), 3);
    assert_eq!(tree[0].replies_more.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn owner_filter_restricts_comment_listing(pool: PgPool) {
    let (user_id, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let other_id = make_user(&pool, "other").await;

    make_comment(&pool, post_id, user_id, None).await;
    make_comment(&pool, post_id, other_id, None).await;
    make_comment(&pool, post_id, other_id, None).await;

    let mine = comment_service::list_post_comments(&pool, post_id, Some(other_id), Some(other_id))
        .await
        .unwrap();

    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|comment| comment.owner_id == other_id));
}

#[sqlx::test(migrations = "./migrations")]
async fn comment_viewer_vote_flag_follows_rating(pool: PgPool) {
    let (user_id, author_id) = make_blogger(&pool, "author").await;
    let category_id = make_category(&pool, "tech").await;
    let post_id = make_post(&pool, author_id, category_id, "hello").await;
    let comment_id = make_comment(&pool, post_id, user_id, None).await;
    let voter_id = make_user(&pool, "voter").await;

    rating_service::apply_vote(&pool, voter_id, RatingTarget::Comment(comment_id), Vote::Dislike)
        .await
        .unwrap();

    let seen_by_voter = comment_service::list_post_comments(&pool, post_id, Some(voter_id), None)
        .await
        .unwrap();
    assert_eq!(seen_by_voter[0].my_vote, Some(-1));
    assert_eq!(seen_by_voter[0].rating, -1);

    let seen_anonymously = comment_service::list_post_comments(&pool, post_id, None, None)
        .await
        .unwrap();
    assert_eq!(seen_anonymously[0].my_vote, None);
}
