//! Authentication test helpers
//!
//! Provides utilities for creating test users and generating tokens.

use sqlx::PgPool;

use justjio::backend::auth::sessions::create_token;
use justjio::backend::auth::users::create_user;
use justjio::shared::config::AppConfig;

/// Secret shared by the test config and the test tokens
pub const TEST_JWT_SECRET: &str = "justjio-test-secret";

/// Origin the test gateway accepts
pub const TEST_ORIGIN: &str = "http://localhost:3000";

/// Test user credentials
pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub token: String,
}

/// Configuration used by every test server
pub fn test_config() -> AppConfig {
    AppConfig::builder()
        .jwt_secret(TEST_JWT_SECRET)
        .allowed_origin(TEST_ORIGIN)
        .build()
        .expect("test config is valid")
}

/// Create a test user in the database
pub async fn create_test_user(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<TestUser, Box<dyn std::error::Error>> {
    let email = format!("{}@example.com", username);
    // Lowest bcrypt cost keeps the suite fast
    let password_hash = bcrypt::hash(password, 4)?;

    let user = create_user(pool, username, &email, &password_hash).await?;
    let token = generate_test_token(user.id, &user.username, &user.email);

    Ok(TestUser {
        id: user.id,
        username: user.username,
        email: user.email,
        password: password.to_string(),
        token,
    })
}

/// Generate a test JWT token
pub fn generate_test_token(user_id: i64, username: &str, email: &str) -> String {
    create_token(TEST_JWT_SECRET, user_id, username, email).expect("Failed to generate test token")
}

/// Create authorization header value
pub fn auth_header(token: &str) -> String {
    format!("Bearer {}", token)
}
