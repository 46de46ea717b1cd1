//! Role-based authorization for admin-only routes.
//!
//! Role dispatch is an exhaustive `match` on [`UserRole`], so adding a role
//! without deciding its access level is a compile error rather than a
//! missing-case bug.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::middleware::auth::AuthUser;
use crate::modules::users::model::UserRole;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// Extractor for admin-only handlers.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn create_game(
///     State(state): State<AppState>,
///     RequireAdmin(auth_user): RequireAdmin,
///     ValidatedJson(dto): ValidatedJson<CreateGameDto>,
/// ) -> Result<(StatusCode, Json<Game>), AppError> {
///     // only reached with a valid ADMIN access token
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        match auth_user.role() {
            UserRole::Admin => Ok(RequireAdmin(auth_user)),
            UserRole::User => Err(AppError::forbidden(anyhow::anyhow!(
                "Access denied. Administrator privileges required."
            ))),
        }
    }
}

/// Author-or-admin rule shared by review mutation paths.
pub fn can_mutate_review(author_id: i64, requester_id: i64, requester_role: UserRole) -> bool {
    match requester_role {
        UserRole::Admin => true,
        UserRole::User => author_id == requester_id,
    }
}
