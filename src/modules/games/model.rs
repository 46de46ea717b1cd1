use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// A catalog entry. `avg_rating` is derived from the game's review set and
/// is never accepted from a client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: i64,
    pub title: String,
    pub genre: String,
    pub avg_rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateGameDto {
    pub title: String,
    pub genre: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateGameDto {
    pub title: Option<String>,
    pub genre: Option<String>,
}
