use sqlx::PgPool;
use tracing::instrument;

use crate::utils::errors::AppError;

use super::model::{CreateGameDto, Game, UpdateGameDto};

pub struct GameService;

impl GameService {
    #[instrument(skip(db))]
    pub async fn create_game(db: &PgPool, dto: CreateGameDto) -> Result<Game, AppError> {
        if dto.title.trim().is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!("Title is required")));
        }
        if dto.genre.trim().is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!("Genre is required")));
        }

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM games WHERE title = $1)")
                .bind(&dto.title)
                .fetch_one(db)
                .await?;

        if exists {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "A game with this title already exists"
            )));
        }

        let game = sqlx::query_as::<_, Game>(
            r#"INSERT INTO games (title, genre)
               VALUES ($1, $2)
               RETURNING id, title, genre, avg_rating, created_at, updated_at"#,
        )
        .bind(&dto.title)
        .bind(&dto.genre)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow::anyhow!(
                    "A game with this title already exists"
                ));
            }
            AppError::from(e)
        })?;

        Ok(game)
    }

    /// Partial update of title/genre. `avg_rating` is never touched here.
    #[instrument(skip(db))]
    pub async fn update_game(db: &PgPool, id: i64, dto: UpdateGameDto) -> Result<Game, AppError> {
        let existing = sqlx::query_as::<_, Game>(
            "SELECT id, title, genre, avg_rating, created_at, updated_at FROM games WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Game not found")))?;

        if let Some(title) = &dto.title {
            if title.trim().is_empty() {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "Title cannot be empty"
                )));
            }

            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM games WHERE title = $1 AND id <> $2)",
            )
            .bind(title)
            .bind(id)
            .fetch_one(db)
            .await?;

            if taken {
                return Err(AppError::bad_request(anyhow::anyhow!(
                    "A game with this title already exists"
                )));
            }
        }

        if let Some(genre) = &dto.genre
            && genre.trim().is_empty()
        {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Genre cannot be empty"
            )));
        }

        let title = dto.title.unwrap_or(existing.title);
        let genre = dto.genre.unwrap_or(existing.genre);

        let game = sqlx::query_as::<_, Game>(
            r#"UPDATE games
               SET title = $1, genre = $2, updated_at = NOW()
               WHERE id = $3
               RETURNING id, title, genre, avg_rating, created_at, updated_at"#,
        )
        .bind(&title)
        .bind(&genre)
        .bind(id)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow::anyhow!(
                    "A game with this title already exists"
                ));
            }
            AppError::from(e)
        })?;

        Ok(game)
    }

    /// Reviews referencing the game are removed by the store's cascade.
    #[instrument(skip(db))]
    pub async fn delete_game(db: &PgPool, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM games WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow::anyhow!("Game not found")));
        }

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_game_by_id(db: &PgPool, id: i64) -> Result<Game, AppError> {
        let game = sqlx::query_as::<_, Game>(
            "SELECT id, title, genre, avg_rating, created_at, updated_at FROM games WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Game not found")))?;

        Ok(game)
    }

    #[instrument(skip(db))]
    pub async fn list_games(db: &PgPool) -> Result<Vec<Game>, AppError> {
        let games = sqlx::query_as::<_, Game>(
            r#"SELECT id, title, genre, avg_rating, created_at, updated_at
               FROM games
               ORDER BY created_at DESC"#,
        )
        .fetch_all(db)
        .await?;

        Ok(games)
    }
}
