//! Fixtures for database-backed tests.

use std::sync::Arc;

use actix_web::web;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;
use crate::middleware::RateLimiter;
use crate::models::AppState;
use crate::services::tokens::{TokenService, TokenSubject};

/// In-memory database with the real migrations applied. A single connection
/// keeps every query on the same in-memory database.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    pool
}

pub fn test_tokens() -> TokenService {
    TokenService::new(
        "test-access-secret",
        "test-refresh-secret",
        Duration::minutes(15),
        Duration::days(7),
    )
}

/// Full handler state over a fresh in-memory database.
pub async fn test_app_state() -> web::Data<AppState> {
    web::Data::new(AppState {
        db: setup_test_db().await,
        config: Config::for_tests(),
        tokens: test_tokens(),
        login_rate_limiter: Arc::new(RateLimiter::new(5, 15 * 60)),
    })
}

/// `Authorization` header value carrying a fresh access token for `user_id`.
pub fn bearer(tokens: &TokenService, user_id: Uuid, email: &str) -> String {
    let token = tokens
        .issue_access_token(&TokenSubject {
            user_id,
            email: email.to_string(),
        })
        .unwrap();
    format!("Bearer {}", token)
}

/// Inserts a user directly, skipping password hashing.
pub async fn create_test_user(pool: &SqlitePool, email: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO users (id, email, name, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(email)
    .bind("Test User")
    .bind("not-a-real-hash")
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    id
}

pub async fn create_test_category(pool: &SqlitePool, user_id: &Uuid, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO categories (id, user_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(name)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    id
}

pub async fn insert_test_expense(
    pool: &SqlitePool,
    user_id: &Uuid,
    category_id: &Uuid,
    amount: f64,
    date: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO expenses (id, user_id, category_id, amount, description, date, payment_method, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(category_id.to_string())
    .bind(amount)
    .bind("Test expense")
    .bind(date)
    .bind("Cash")
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    id
}
