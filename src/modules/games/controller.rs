use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireAdmin;
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::reviews::model::{CreateReviewDto, Review};
use crate::modules::reviews::service::ReviewService;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{CreateGameDto, Game, UpdateGameDto};
use super::service::GameService;

/// List the game catalog
#[utoipa::path(
    get,
    path = "/api/games",
    responses(
        (status = 200, description = "All games, newest first", body = Vec<Game>)
    ),
    tag = "Games"
)]
#[instrument(skip(state))]
pub async fn list_games(State(state): State<AppState>) -> Result<Json<Vec<Game>>, AppError> {
    let games = GameService::list_games(&state.db).await?;
    Ok(Json(games))
}

/// Get a game by id
#[utoipa::path(
    get,
    path = "/api/games/{id}",
    params(("id" = i64, Path, description = "Game ID")),
    responses(
        (status = 200, description = "Game details", body = Game),
        (status = 404, description = "Game not found", body = ErrorResponse)
    ),
    tag = "Games"
)]
#[instrument(skip(state))]
pub async fn get_game_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Game>, AppError> {
    let game = GameService::get_game_by_id(&state.db, id).await?;
    Ok(Json(game))
}

/// List the reviews of a game
#[utoipa::path(
    get,
    path = "/api/games/{id}/reviews",
    params(("id" = i64, Path, description = "Game ID")),
    responses(
        (status = 200, description = "Reviews for the game", body = Vec<Review>)
    ),
    tag = "Games"
)]
#[instrument(skip(state))]
pub async fn list_game_reviews(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = ReviewService::list_reviews_for_game(&state.db, id).await?;
    Ok(Json(reviews))
}

/// Create a game (admin)
#[utoipa::path(
    post,
    path = "/api/games",
    request_body = CreateGameDto,
    responses(
        (status = 201, description = "Game created", body = Game),
        (status = 400, description = "Invalid input or duplicate title", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Administrator privileges required", body = ErrorResponse)
    ),
    tag = "Games",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_game(
    State(state): State<AppState>,
    RequireAdmin(_auth_user): RequireAdmin,
    ValidatedJson(dto): ValidatedJson<CreateGameDto>,
) -> Result<(StatusCode, Json<Game>), AppError> {
    let game = GameService::create_game(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// Update a game (admin)
#[utoipa::path(
    put,
    path = "/api/games/{id}",
    params(("id" = i64, Path, description = "Game ID")),
    request_body = UpdateGameDto,
    responses(
        (status = 200, description = "Game updated", body = Game),
        (status = 400, description = "Invalid input or duplicate title", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Administrator privileges required", body = ErrorResponse),
        (status = 404, description = "Game not found", body = ErrorResponse)
    ),
    tag = "Games",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_game(
    State(state): State<AppState>,
    RequireAdmin(_auth_user): RequireAdmin,
    Path(id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<UpdateGameDto>,
) -> Result<Json<Game>, AppError> {
    let game = GameService::update_game(&state.db, id, dto).await?;
    Ok(Json(game))
}

/// Delete a game (admin)
#[utoipa::path(
    delete,
    path = "/api/games/{id}",
    params(("id" = i64, Path, description = "Game ID")),
    responses(
        (status = 204, description = "Game deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Administrator privileges required", body = ErrorResponse),
        (status = 404, description = "Game not found", body = ErrorResponse)
    ),
    tag = "Games",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_game(
    State(state): State<AppState>,
    RequireAdmin(_auth_user): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    GameService::delete_game(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Post a review for a game (one per user per game)
#[utoipa::path(
    post,
    path = "/api/games/{id}/reviews",
    params(("id" = i64, Path, description = "Game ID")),
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Invalid input or game already reviewed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Game not found", body = ErrorResponse)
    ),
    tag = "Games",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn review_game(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let author_id = auth_user.user_id()?;
    let review = ReviewService::create_review(&state.db, id, author_id, dto).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
