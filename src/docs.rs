use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::auth::model::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequestDto,
};
use crate::modules::games::model::{CreateGameDto, Game, UpdateGameDto};
use crate::modules::reviews::model::{CreateReviewDto, Review, UpdateReviewDto};
use crate::modules::users::model::{User, UserRole};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::refresh_token,
        crate::modules::games::controller::list_games,
        crate::modules::games::controller::get_game_by_id,
        crate::modules::games::controller::list_game_reviews,
        crate::modules::games::controller::create_game,
        crate::modules::games::controller::update_game,
        crate::modules::games::controller::delete_game,
        crate::modules::games::controller::review_game,
        crate::modules::reviews::controller::create_review,
        crate::modules::reviews::controller::update_review,
        crate::modules::reviews::controller::delete_review,
        crate::modules::reviews::controller::list_reviews_by_game,
    ),
    components(
        schemas(
            User,
            UserRole,
            RegisterRequestDto,
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            RefreshResponse,
            Game,
            CreateGameDto,
            UpdateGameDto,
            Review,
            CreateReviewDto,
            UpdateReviewDto,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Register, login and token refresh"),
        (name = "Games", description = "Game catalog endpoints"),
        (name = "Reviews", description = "Game review endpoints")
    ),
    info(
        title = "Playgrade API",
        version = "0.1.0",
        description = "A game-review REST API built with Rust, Axum, and PostgreSQL featuring JWT-based authentication.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
