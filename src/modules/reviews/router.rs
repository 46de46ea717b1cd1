use axum::{Router, routing::post, routing::put};

use crate::state::AppState;

use super::controller::{create_review, delete_review, list_reviews_by_game, update_review};

pub fn init_reviews_router() -> Router<AppState> {
    Router::new()
        .route(
            "/game/{game_id}",
            post(create_review).get(list_reviews_by_game),
        )
        .route("/{id}", put(update_review).delete(delete_review))
}
