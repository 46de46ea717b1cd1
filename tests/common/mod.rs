use playgrade::config::cors::CorsConfig;
use playgrade::config::jwt::JwtConfig;
use playgrade::modules::users::model::UserRole;
use playgrade::router::init_router;
use playgrade::state::AppState;
use playgrade::utils::jwt::{TokenKind, create_token};
use playgrade::utils::password::hash_password;
use sqlx::PgPool;

#[allow(dead_code)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

pub async fn setup_test_app(pool: PgPool) -> axum::Router {
    dotenvy::dotenv().ok();
    let state = AppState {
        db: pool,
        jwt_config: JwtConfig::from_env(),
        cors_config: CorsConfig::from_env(),
    };
    init_router(state)
}

#[allow(dead_code)]
pub async fn create_test_user(
    pool: &PgPool,
    email: &str,
    password: &str,
    role: UserRole,
) -> TestUser {
    let hashed = hash_password(password).unwrap();
    let role_str = match role {
        UserRole::User => "USER",
        UserRole::Admin => "ADMIN",
    };

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (name, email, password, role)
         VALUES ('Test User', $1, $2, $3::user_role)
         RETURNING id",
    )
    .bind(email)
    .bind(&hashed)
    .bind(role_str)
    .fetch_one(pool)
    .await
    .unwrap();

    TestUser {
        id,
        email: email.to_string(),
        password: password.to_string(),
        role,
    }
}

/// Mints an access token the way the running app would accept it.
#[allow(dead_code)]
pub fn access_token_for(user: &TestUser) -> String {
    dotenvy::dotenv().ok();
    create_token(user.id, user.role, TokenKind::Access, &JwtConfig::from_env()).unwrap()
}

#[allow(dead_code)]
pub async fn create_test_game(pool: &PgPool, title: &str, genre: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("INSERT INTO games (title, genre) VALUES ($1, $2) RETURNING id")
        .bind(title)
        .bind(genre)
        .fetch_one(pool)
        .await
        .unwrap()
}
