use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::config::jwt::JwtConfig;
use crate::modules::auth::model::Claims;
use crate::modules::users::model::UserRole;
use crate::utils::errors::AppError;

/// The two token classes issued by the API, distinguished by signing secret
/// and lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn secret<'a>(&self, jwt_config: &'a JwtConfig) -> &'a str {
        match self {
            TokenKind::Access => &jwt_config.access_secret,
            TokenKind::Refresh => &jwt_config.refresh_secret,
        }
    }

    fn expiry(&self, jwt_config: &JwtConfig) -> i64 {
        match self {
            TokenKind::Access => jwt_config.access_token_expiry,
            TokenKind::Refresh => jwt_config.refresh_token_expiry,
        }
    }
}

pub fn create_token(
    user_id: i64,
    role: UserRole,
    kind: TokenKind,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let exp = now + kind.expiry(jwt_config);

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: exp as usize,
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(kind.secret(jwt_config).as_bytes()),
    )
    .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {}", e)))
}

/// Checks signature AND expiry. Both failure modes collapse into the same
/// 401 so callers cannot tell a forged token from an expired one.
pub fn verify_token(
    token: &str,
    kind: TokenKind,
    jwt_config: &JwtConfig,
) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(kind.secret(jwt_config).as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized(anyhow::anyhow!("Invalid or expired token")))
}
