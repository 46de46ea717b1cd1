use chrono::{TimeZone, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::config::jwt::JwtConfig;
use crate::modules::users::model::{User, UserRole};
use crate::utils::errors::AppError;
use crate::utils::jwt::{TokenKind, create_token, verify_token};
use crate::utils::password::{hash_password, verify_password};

use super::model::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RefreshTokenRecord,
    RegisterRequestDto,
};

pub struct AuthService;

impl AuthService {
    /// Registers a new USER. The role can never be supplied by the caller.
    #[instrument(skip(db, dto))]
    pub async fn register_user(db: &PgPool, dto: RegisterRequestDto) -> Result<User, AppError> {
        if dto.name.trim().is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!("Name is required")));
        }
        if dto.email.trim().is_empty() {
            return Err(AppError::bad_request(anyhow::anyhow!("Email is required")));
        }
        if dto.password.chars().count() < 6 {
            return Err(AppError::bad_request(anyhow::anyhow!(
                "Password must be at least 6 characters"
            )));
        }

        // Exact string match, no normalization
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&dto.email)
                .fetch_one(db)
                .await?;

        if exists {
            return Err(AppError::bad_request(anyhow::anyhow!("Email already in use")));
        }

        let hashed_password = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password, role)
             VALUES ($1, $2, $3, 'USER')
             RETURNING id, name, email, role",
        )
        .bind(&dto.name)
        .bind(&dto.email)
        .bind(&hashed_password)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow::anyhow!("Email already in use"));
            }
            AppError::from(e)
        })?;

        Ok(user)
    }

    /// Authenticates and issues an access/refresh token pair.
    ///
    /// Unknown email and wrong password collapse into the same error so the
    /// response cannot be used to enumerate accounts.
    #[instrument(skip(db, dto, jwt_config))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        #[derive(sqlx::FromRow)]
        struct UserWithPassword {
            id: i64,
            name: String,
            email: String,
            password: String,
            role: UserRole,
        }

        let row = sqlx::query_as::<_, UserWithPassword>(
            "SELECT id, name, email, password, role FROM users WHERE email = $1",
        )
        .bind(&dto.email)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("Invalid email or password")))?;

        let is_valid = verify_password(&dto.password, &row.password)?;

        if !is_valid {
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Invalid email or password"
            )));
        }

        let access_token = create_token(row.id, row.role, TokenKind::Access, jwt_config)?;
        let refresh_token = create_token(row.id, row.role, TokenKind::Refresh, jwt_config)?;

        // The stored expiry comes from the freshly issued token's own exp
        // claim rather than being recomputed from config.
        let claims = verify_token(&refresh_token, TokenKind::Refresh, jwt_config)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp as i64, 0)
            .single()
            .ok_or_else(|| AppError::internal(anyhow::anyhow!("Invalid expiry in refresh token")))?;

        sqlx::query("INSERT INTO refresh_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&refresh_token)
            .bind(row.id)
            .bind(expires_at)
            .execute(db)
            .await?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            user: User {
                id: row.id,
                name: row.name,
                email: row.email,
                role: row.role,
            },
        })
    }

    /// Exchanges a stored refresh token for a new access token.
    ///
    /// The refresh token itself is not rotated or deleted on success; a
    /// stored record whose `expires_at` has passed is removed as a side
    /// effect of the failed attempt.
    #[instrument(skip(db, dto, jwt_config))]
    pub async fn refresh_token(
        db: &PgPool,
        dto: RefreshRequest,
        jwt_config: &JwtConfig,
    ) -> Result<RefreshResponse, AppError> {
        let stored = sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT id, token, user_id, expires_at FROM refresh_tokens WHERE token = $1",
        )
        .bind(&dto.refresh_token)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("Invalid refresh token")))?;

        if stored.expires_at < Utc::now() {
            sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
                .bind(&dto.refresh_token)
                .execute(db)
                .await?;
            return Err(AppError::unauthorized(anyhow::anyhow!(
                "Refresh token expired"
            )));
        }

        // The stored record alone is not trusted: the signature must still
        // verify against the refresh secret.
        let claims = verify_token(&dto.refresh_token, TokenKind::Refresh, jwt_config)
            .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid refresh token")))?;

        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid refresh token")))?;

        let user =
            sqlx::query_as::<_, User>("SELECT id, name, email, role FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| AppError::unauthorized(anyhow::anyhow!("User not found")))?;

        let access_token = create_token(user.id, user.role, TokenKind::Access, jwt_config)?;

        Ok(RefreshResponse { access_token, user })
    }
}
