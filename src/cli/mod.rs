//! CLI commands that bypass the HTTP API.
//!
//! ADMIN accounts cannot be created through registration; they are seeded
//! here, directly against the database.

use sqlx::PgPool;

use crate::utils::errors::AppError;
use crate::utils::password::hash_password;

/// Creates an ADMIN user. Fails if the email is already registered.
pub async fn create_admin_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), AppError> {
    if password.chars().count() < 6 {
        return Err(AppError::bad_request(anyhow::anyhow!(
            "Password must be at least 6 characters"
        )));
    }

    let hashed_password = hash_password(password)?;

    sqlx::query("INSERT INTO users (name, email, password, role) VALUES ($1, $2, $3, 'ADMIN')")
        .bind(name)
        .bind(email)
        .bind(&hashed_password)
        .execute(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow::anyhow!("Email already in use"));
            }
            AppError::from(e)
        })?;

    Ok(())
}
