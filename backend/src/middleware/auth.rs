use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;

use crate::services::tokens::{Claims, TokenError, TokenService};

/// Extract and verify the access token from the Authorization header
pub fn extract_claims(req: &HttpRequest, tokens: &TokenService) -> Result<Claims, AuthMiddlewareError> {
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthMiddlewareError::MissingToken)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthMiddlewareError::MissingToken)?;

    let token = bearer_token(auth_str).ok_or(AuthMiddlewareError::MissingToken)?;

    tokens.verify_access_token(token).map_err(|e| match e {
        TokenError::Expired => AuthMiddlewareError::ExpiredToken,
        _ => AuthMiddlewareError::InvalidToken,
    })
}

fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

#[derive(Debug)]
pub enum AuthMiddlewareError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

impl std::fmt::Display for AuthMiddlewareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMiddlewareError::MissingToken => write!(f, "No token provided"),
            AuthMiddlewareError::InvalidToken => write!(f, "Invalid token"),
            AuthMiddlewareError::ExpiredToken => write!(f, "Token expired"),
        }
    }
}

impl std::error::Error for AuthMiddlewareError {}
