use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::UserRow;
use crate::services::tokens::{TokenError, TokenPair, TokenService, TokenSubject};
use shared::{LoginRequest, SignupRequest, User};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User with this email already exists")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("User not found")]
    UserNotFound,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Password hashing error")]
    HashingError,
    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),
    #[error("Corrupt user record: {0}")]
    CorruptRecord(#[from] uuid::Error),
}

/// Result of a successful signup or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

impl AuthSession {
    fn new(user: User, pair: TokenPair) -> Self {
        Self {
            user,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::HashingError)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Hex SHA-256 of a refresh token, the form in which it is stored.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

pub async fn signup(
    pool: &SqlitePool,
    tokens: &TokenService,
    request: &SignupRequest,
) -> Result<AuthSession, AuthError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(&request.email)
        .fetch_one(pool)
        .await?;

    if existing > 0 {
        return Err(AuthError::EmailTaken);
    }

    let password_hash = hash_password(&request.password)?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    let pair = tokens.issue_pair(&TokenSubject {
        user_id: id,
        email: request.email.clone(),
    })?;

    // The row is created with its first refresh token already in place.
    let result = sqlx::query(
        r#"
        INSERT INTO users (id, email, name, password_hash, refresh_token_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&request.email)
    .bind(&request.name)
    .bind(&password_hash)
    .bind(hash_token(&pair.refresh_token))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            log::info!("User {} signed up", id);
            let user = User {
                id,
                email: request.email.clone(),
                name: request.name.clone(),
                created_at: now,
            };
            Ok(AuthSession::new(user, pair))
        }
        Err(sqlx::Error::Database(e)) if e.message().contains("UNIQUE constraint failed") => {
            Err(AuthError::EmailTaken)
        }
        Err(e) => Err(AuthError::DatabaseError(e)),
    }
}

pub async fn login(
    pool: &SqlitePool,
    tokens: &TokenService,
    request: &LoginRequest,
) -> Result<AuthSession, AuthError> {
    let user: UserRow = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(pool)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    verify_password(&request.password, &user.password_hash)?;

    let user_id = user.user_id()?;
    let pair = tokens.issue_pair(&TokenSubject {
        user_id,
        email: user.email.clone(),
    })?;

    // Replacing the digest ends whatever session lineage existed before.
    sqlx::query("UPDATE users SET refresh_token_hash = ?, updated_at = ? WHERE id = ?")
        .bind(hash_token(&pair.refresh_token))
        .bind(Utc::now())
        .bind(&user.id)
        .execute(pool)
        .await?;

    log::info!("User {} logged in", user_id);

    Ok(AuthSession::new(user.to_shared()?, pair))
}

pub async fn refresh(
    pool: &SqlitePool,
    tokens: &TokenService,
    presented: &str,
) -> Result<TokenPair, AuthError> {
    let claims = tokens.verify_refresh_token(presented).map_err(|e| {
        log::warn!("Refresh token rejected: {}", e);
        AuthError::InvalidRefreshToken
    })?;

    let subject = claims.subject();
    let pair = tokens.issue_pair(&subject)?;

    // Compare-and-swap on the stored digest: a token that was already
    // rotated away, or cleared by logout, matches no row.
    let result = sqlx::query(
        r#"
        UPDATE users
        SET refresh_token_hash = ?, updated_at = ?
        WHERE id = ? AND refresh_token_hash = ?
        "#,
    )
    .bind(hash_token(&pair.refresh_token))
    .bind(Utc::now())
    .bind(subject.user_id.to_string())
    .bind(hash_token(presented))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        log::warn!("Stale or revoked refresh token presented for user {}", subject.user_id);
        return Err(AuthError::InvalidRefreshToken);
    }

    Ok(pair)
}

pub async fn logout(pool: &SqlitePool, user_id: &Uuid) -> Result<(), AuthError> {
    let result = sqlx::query("UPDATE users SET refresh_token_hash = NULL, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        log::warn!("Logout for unknown user {}", user_id);
    } else {
        log::info!("User {} logged out", user_id);
    }

    Ok(())
}

pub async fn get_current_user(pool: &SqlitePool, user_id: &Uuid) -> Result<User, AuthError> {
    let user: UserRow = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(user.to_shared()?)
}
