use std::sync::Arc;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::middleware::RateLimiter;
use crate::services::tokens::TokenService;

pub mod category;
pub mod expense;
pub mod user;

pub use category::*;
pub use expense::*;
pub use user::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub tokens: TokenService,
    pub login_rate_limiter: Arc<RateLimiter>,
}
