//! User entity and role definitions.
//!
//! Registration always produces [`UserRole::User`]; `ADMIN` rows are created
//! administratively (see the `create-admin` CLI command). The password hash
//! is never part of any serialized view.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// The two fixed roles of the platform.
///
/// Stored as the Postgres enum `user_role` and carried verbatim in token
/// claims. Authorization decisions match on this exhaustively, so a new
/// variant breaks every decision point at compile time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
}

/// Public user view: what register/login/refresh return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}
