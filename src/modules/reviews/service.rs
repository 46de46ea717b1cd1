use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;

use crate::middleware::role::can_mutate_review;
use crate::modules::users::model::UserRole;
use crate::utils::errors::AppError;

use super::model::{CreateReviewDto, Review, UpdateReviewDto};

/// Rewrites a game's `avg_rating` from its current review set: the
/// arithmetic mean, or 0 when no reviews remain.
///
/// Runs on the transaction of the triggering mutation, so the committed
/// review set and the aggregate are never observable out of sync.
async fn recompute_avg_rating(
    tx: &mut Transaction<'_, Postgres>,
    game_id: i64,
) -> Result<(), AppError> {
    sqlx::query(
        r#"UPDATE games
           SET avg_rating = COALESCE(
                   (SELECT AVG(rating)::float8 FROM reviews WHERE game_id = $1), 0),
               updated_at = NOW()
           WHERE id = $1"#,
    )
    .bind(game_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub struct ReviewService;

impl ReviewService {
    /// Creates the author's review for a game, at most one per
    /// (author, game) pair.
    ///
    /// The pre-check gives the friendly message; the store's unique
    /// constraint makes the invariant hold against concurrent submissions
    /// and maps to the same 400.
    #[instrument(skip(db, dto))]
    pub async fn create_review(
        db: &PgPool,
        game_id: i64,
        author_id: i64,
        dto: CreateReviewDto,
    ) -> Result<Review, AppError> {
        if !(1..=5).contains(&dto.rating) {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Rating must be between 1 and 5"
            )));
        }
        if let Some(comment) = &dto.comment
            && comment.chars().count() > 500
        {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Comment must be at most 500 characters"
            )));
        }

        let game_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM games WHERE id = $1)")
                .bind(game_id)
                .fetch_one(db)
                .await?;

        if !game_exists {
            return Err(AppError::not_found(anyhow::anyhow!("Game not found")));
        }

        let already_reviewed = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE author_id = $1 AND game_id = $2)",
        )
        .bind(author_id)
        .bind(game_id)
        .fetch_one(db)
        .await?;

        if already_reviewed {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "You have already reviewed this game"
            )));
        }

        let comment = dto.comment.unwrap_or_default();

        let mut tx = db.begin().await?;

        let review = sqlx::query_as::<_, Review>(
            r#"INSERT INTO reviews (rating, comment, game_id, author_id)
               VALUES ($1, $2, $3, $4)
               RETURNING id, rating, comment, game_id, author_id, created_at, updated_at"#,
        )
        .bind(dto.rating)
        .bind(&comment)
        .bind(game_id)
        .bind(author_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow::anyhow!(
                    "You have already reviewed this game"
                ));
            }
            AppError::from(e)
        })?;

        recompute_avg_rating(&mut tx, game_id).await?;

        tx.commit().await?;

        Ok(review)
    }

    /// Updates rating and/or comment; only the author or an ADMIN may do so.
    #[instrument(skip(db, dto))]
    pub async fn update_review(
        db: &PgPool,
        id: i64,
        requester_id: i64,
        requester_role: UserRole,
        dto: UpdateReviewDto,
    ) -> Result<Review, AppError> {
        if dto.rating.is_none() && dto.comment.is_none() {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "No fields provided to update"
            )));
        }
        if let Some(rating) = dto.rating
            && !(1..=5).contains(&rating)
        {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Rating must be between 1 and 5"
            )));
        }
        if let Some(comment) = &dto.comment {
            if comment.trim().is_empty() {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Comment cannot be empty"
                )));
            }
            if comment.chars().count() > 500 {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Comment must be at most 500 characters"
                )));
            }
        }

        let review = sqlx::query_as::<_, Review>(
            "SELECT id, rating, comment, game_id, author_id, created_at, updated_at
             FROM reviews WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Review not found")))?;

        if !can_mutate_review(review.author_id, requester_id, requester_role) {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "You cannot edit this review"
            )));
        }

        let rating = dto.rating.unwrap_or(review.rating);
        let comment = dto.comment.unwrap_or(review.comment);

        let mut tx = db.begin().await?;

        let updated = sqlx::query_as::<_, Review>(
            r#"UPDATE reviews
               SET rating = $1, comment = $2, updated_at = NOW()
               WHERE id = $3
               RETURNING id, rating, comment, game_id, author_id, created_at, updated_at"#,
        )
        .bind(rating)
        .bind(&comment)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        recompute_avg_rating(&mut tx, updated.game_id).await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Deletes a review under the same author-or-admin rule as update.
    #[instrument(skip(db))]
    pub async fn delete_review(
        db: &PgPool,
        id: i64,
        requester_id: i64,
        requester_role: UserRole,
    ) -> Result<(), AppError> {
        let review = sqlx::query_as::<_, Review>(
            "SELECT id, rating, comment, game_id, author_id, created_at, updated_at
             FROM reviews WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Review not found")))?;

        if !can_mutate_review(review.author_id, requester_id, requester_role) {
            return Err(AppError::forbidden(anyhow::anyhow!(
                "You cannot delete this review"
            )));
        }

        let mut tx = db.begin().await?;

        sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        recompute_avg_rating(&mut tx, review.game_id).await?;

        tx.commit().await?;

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn list_reviews_for_game(db: &PgPool, game_id: i64) -> Result<Vec<Review>, AppError> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"SELECT id, rating, comment, game_id, author_id, created_at, updated_at
               FROM reviews
               WHERE game_id = $1
               ORDER BY created_at DESC"#,
        )
        .bind(game_id)
        .fetch_all(db)
        .await?;

        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn seed_user(pool: &PgPool, email: &str, role: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (name, email, password, role)
             VALUES ('Test', $1, 'hashed', $2::user_role)
             RETURNING id",
        )
        .bind(email)
        .bind(role)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn seed_game(pool: &PgPool, title: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO games (title, genre) VALUES ($1, 'RPG') RETURNING id",
        )
        .bind(title)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn avg_rating(pool: &PgPool, game_id: i64) -> f64 {
        sqlx::query_scalar::<_, f64>("SELECT avg_rating FROM games WHERE id = $1")
            .bind(game_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn create_dto(rating: i32, comment: Option<&str>) -> CreateReviewDto {
        CreateReviewDto {
            rating,
            comment: comment.map(str::to_string),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_review_rating_boundaries(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let low = seed_user(&pool, "low@test.com", "USER").await;
        let high = seed_user(&pool, "high@test.com", "USER").await;
        let zero = seed_user(&pool, "zero@test.com", "USER").await;
        let six = seed_user(&pool, "six@test.com", "USER").await;

        let result = ReviewService::create_review(&pool, game_id, zero, create_dto(0, None)).await;
        assert_eq!(result.unwrap_err().status, StatusCode::BAD_REQUEST);

        let result = ReviewService::create_review(&pool, game_id, six, create_dto(6, None)).await;
        assert_eq!(result.unwrap_err().status, StatusCode::BAD_REQUEST);

        let one = ReviewService::create_review(&pool, game_id, low, create_dto(1, None))
            .await
            .unwrap();
        assert_eq!(one.rating, 1);

        let five = ReviewService::create_review(&pool, game_id, high, create_dto(5, None))
            .await
            .unwrap();
        assert_eq!(five.rating, 5);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_review_defaults_comment_to_empty(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;

        let review = ReviewService::create_review(&pool, game_id, author_id, create_dto(4, None))
            .await
            .unwrap();

        assert_eq!(review.comment, "");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_review_comment_too_long(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;
        let long_comment = "a".repeat(501);

        let result = ReviewService::create_review(
            &pool,
            game_id,
            author_id,
            create_dto(4, Some(&long_comment)),
        )
        .await;

        assert_eq!(result.unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_review_unknown_game(pool: PgPool) {
        let author_id = seed_user(&pool, "author@test.com", "USER").await;

        let result = ReviewService::create_review(&pool, 9999, author_id, create_dto(4, None)).await;

        assert_eq!(result.unwrap_err().status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_create_review_one_per_author_and_game(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;

        ReviewService::create_review(&pool, game_id, author_id, create_dto(5, None))
            .await
            .unwrap();

        let second =
            ReviewService::create_review(&pool, game_id, author_id, create_dto(3, None)).await;
        assert_eq!(second.unwrap_err().status, StatusCode::BAD_REQUEST);

        // The same author may still review a different game
        let other_game = seed_game(&pool, "Hades").await;
        let result =
            ReviewService::create_review(&pool, other_game, author_id, create_dto(4, None)).await;
        assert!(result.is_ok());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_avg_rating_tracks_creates(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let first = seed_user(&pool, "first@test.com", "USER").await;
        let second = seed_user(&pool, "second@test.com", "USER").await;

        assert_eq!(avg_rating(&pool, game_id).await, 0.0);

        ReviewService::create_review(&pool, game_id, first, create_dto(5, None))
            .await
            .unwrap();
        assert_eq!(avg_rating(&pool, game_id).await, 5.0);

        ReviewService::create_review(&pool, game_id, second, create_dto(4, None))
            .await
            .unwrap();
        assert_eq!(avg_rating(&pool, game_id).await, 4.5);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_review_by_author(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;

        let review = ReviewService::create_review(
            &pool,
            game_id,
            author_id,
            create_dto(2, Some("Rough start")),
        )
        .await
        .unwrap();

        let updated = ReviewService::update_review(
            &pool,
            review.id,
            author_id,
            UserRole::User,
            UpdateReviewDto {
                rating: Some(5),
                comment: Some("It grew on me".to_string()),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.rating, 5);
        assert_eq!(updated.comment, "It grew on me");
        assert_eq!(avg_rating(&pool, game_id).await, 5.0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_review_partial_keeps_comment(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;

        let review = ReviewService::create_review(
            &pool,
            game_id,
            author_id,
            create_dto(2, Some("Still deciding")),
        )
        .await
        .unwrap();

        let updated = ReviewService::update_review(
            &pool,
            review.id,
            author_id,
            UserRole::User,
            UpdateReviewDto {
                rating: Some(4),
                comment: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.rating, 4);
        assert_eq!(updated.comment, "Still deciding");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_review_requires_some_field(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;

        let review = ReviewService::create_review(&pool, game_id, author_id, create_dto(3, None))
            .await
            .unwrap();

        let result = ReviewService::update_review(
            &pool,
            review.id,
            author_id,
            UserRole::User,
            UpdateReviewDto {
                rating: None,
                comment: None,
            },
        )
        .await;

        assert_eq!(result.unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_review_rejects_blank_comment(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;

        let review = ReviewService::create_review(&pool, game_id, author_id, create_dto(3, None))
            .await
            .unwrap();

        let result = ReviewService::update_review(
            &pool,
            review.id,
            author_id,
            UserRole::User,
            UpdateReviewDto {
                rating: None,
                comment: Some("   ".to_string()),
            },
        )
        .await;

        assert_eq!(result.unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_review_not_found(pool: PgPool) {
        let requester = seed_user(&pool, "req@test.com", "USER").await;

        let result = ReviewService::update_review(
            &pool,
            9999,
            requester,
            UserRole::User,
            UpdateReviewDto {
                rating: Some(3),
                comment: None,
            },
        )
        .await;

        assert_eq!(result.unwrap_err().status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_update_review_forbidden_for_non_author(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;
        let stranger = seed_user(&pool, "stranger@test.com", "USER").await;

        let review = ReviewService::create_review(&pool, game_id, author_id, create_dto(3, None))
            .await
            .unwrap();

        let result = ReviewService::update_review(
            &pool,
            review.id,
            stranger,
            UserRole::User,
            UpdateReviewDto {
                rating: Some(1),
                comment: None,
            },
        )
        .await;

        assert_eq!(result.unwrap_err().status, StatusCode::FORBIDDEN);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_admin_can_update_any_review(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;
        let admin_id = seed_user(&pool, "admin@test.com", "ADMIN").await;

        let review = ReviewService::create_review(&pool, game_id, author_id, create_dto(3, None))
            .await
            .unwrap();

        let updated = ReviewService::update_review(
            &pool,
            review.id,
            admin_id,
            UserRole::Admin,
            UpdateReviewDto {
                rating: Some(1),
                comment: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.rating, 1);
        assert_eq!(updated.author_id, author_id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_review_recomputes_to_zero(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;

        let review = ReviewService::create_review(&pool, game_id, author_id, create_dto(5, None))
            .await
            .unwrap();
        assert_eq!(avg_rating(&pool, game_id).await, 5.0);

        ReviewService::delete_review(&pool, review.id, author_id, UserRole::User)
            .await
            .unwrap();

        assert_eq!(avg_rating(&pool, game_id).await, 0.0);
        let reviews = ReviewService::list_reviews_for_game(&pool, game_id).await.unwrap();
        assert!(reviews.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_review_forbidden_for_non_author(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;
        let stranger = seed_user(&pool, "stranger@test.com", "USER").await;

        let review = ReviewService::create_review(&pool, game_id, author_id, create_dto(3, None))
            .await
            .unwrap();

        let result =
            ReviewService::delete_review(&pool, review.id, stranger, UserRole::User).await;

        assert_eq!(result.unwrap_err().status, StatusCode::FORBIDDEN);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_admin_can_delete_any_review(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let author_id = seed_user(&pool, "author@test.com", "USER").await;
        let admin_id = seed_user(&pool, "admin@test.com", "ADMIN").await;

        let review = ReviewService::create_review(&pool, game_id, author_id, create_dto(3, None))
            .await
            .unwrap();

        ReviewService::delete_review(&pool, review.id, admin_id, UserRole::Admin)
            .await
            .unwrap();

        let reviews = ReviewService::list_reviews_for_game(&pool, game_id).await.unwrap();
        assert!(reviews.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_review_not_found(pool: PgPool) {
        let requester = seed_user(&pool, "req@test.com", "USER").await;

        let result = ReviewService::delete_review(&pool, 9999, requester, UserRole::User).await;

        assert_eq!(result.unwrap_err().status, StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_avg_rating_tracks_mixed_mutations(pool: PgPool) {
        let game_id = seed_game(&pool, "Elden Ring").await;
        let first = seed_user(&pool, "first@test.com", "USER").await;
        let second = seed_user(&pool, "second@test.com", "USER").await;

        let r1 = ReviewService::create_review(&pool, game_id, first, create_dto(2, None))
            .await
            .unwrap();
        ReviewService::create_review(&pool, game_id, second, create_dto(4, None))
            .await
            .unwrap();
        assert_eq!(avg_rating(&pool, game_id).await, 3.0);

        ReviewService::update_review(
            &pool,
            r1.id,
            first,
            UserRole::User,
            UpdateReviewDto {
                rating: Some(5),
                comment: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(avg_rating(&pool, game_id).await, 4.5);

        ReviewService::delete_review(&pool, r1.id, first, UserRole::User)
            .await
            .unwrap();
        assert_eq!(avg_rating(&pool, game_id).await, 4.0);
    }
}
