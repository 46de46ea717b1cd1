use axum::{Router, routing::get};

use crate::state::AppState;

use super::controller::{
    create_game, delete_game, get_game_by_id, list_game_reviews, list_games, review_game,
    update_game,
};

pub fn init_games_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_games).post(create_game))
        .route(
            "/{id}",
            get(get_game_by_id).put(update_game).delete(delete_game),
        )
        .route("/{id}/reviews", get(list_game_reviews).post(review_game))
}
