use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::instrument;

use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::validator::ValidatedJson;

use super::model::{CreateReviewDto, Review, UpdateReviewDto};
use super::service::ReviewService;

/// Post a review for a game (one per user per game)
#[utoipa::path(
    post,
    path = "/api/reviews/game/{gameId}",
    params(("gameId" = i64, Path, description = "Game ID")),
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review created", body = Review),
        (status = 400, description = "Invalid input or game already reviewed", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Game not found", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(game_id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let author_id = auth_user.user_id()?;
    let review = ReviewService::create_review(&state.db, game_id, author_id, dto).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// Update a review (author or admin)
#[utoipa::path(
    put,
    path = "/api/reviews/{id}",
    params(("id" = i64, Path, description = "Review ID")),
    request_body = UpdateReviewDto,
    responses(
        (status = 200, description = "Review updated", body = Review),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author and not an admin", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<UpdateReviewDto>,
) -> Result<Json<Review>, AppError> {
    let requester_id = auth_user.user_id()?;
    let review =
        ReviewService::update_review(&state.db, id, requester_id, auth_user.role(), dto).await?;
    Ok(Json(review))
}

/// Delete a review (author or admin)
#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(("id" = i64, Path, description = "Review ID")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author and not an admin", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    ),
    tag = "Reviews",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_review(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let requester_id = auth_user.user_id()?;
    ReviewService::delete_review(&state.db, id, requester_id, auth_user.role()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the reviews of a game
#[utoipa::path(
    get,
    path = "/api/reviews/game/{gameId}",
    params(("gameId" = i64, Path, description = "Game ID")),
    responses(
        (status = 200, description = "Reviews for the game", body = Vec<Review>)
    ),
    tag = "Reviews"
)]
#[instrument(skip(state))]
pub async fn list_reviews_by_game(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = ReviewService::list_reviews_for_game(&state.db, game_id).await?;
    Ok(Json(reviews))
}
