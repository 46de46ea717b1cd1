use std::env;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            access_secret: env::var("JWT_ACCESS_SECRET")
                .unwrap_or_else(|_| "access-secret-change-in-production".to_string()),
            refresh_secret: env::var("JWT_REFRESH_SECRET")
                .unwrap_or_else(|_| "refresh-secret-change-in-production".to_string()),
            access_token_expiry: env::var("ACCESS_TOKEN_EXPIRES_IN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(900), // 15 minutes
            refresh_token_expiry: env::var("REFRESH_TOKEN_EXPIRES_IN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(604800), // 7 days
        }
    }
}
