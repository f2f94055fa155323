use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use shared::{
    AccessTokenResponse, ApiMessage, ApiSuccess, AuthResponse, LoginRequest, RefreshRequest,
    SignupRequest, UserResponse,
};
use validator::Validate;

use crate::error::AppError;
use crate::middleware::auth::extract_claims;
use crate::models::AppState;
use crate::services::auth::{self as auth_service, AuthError};

pub const REFRESH_COOKIE: &str = "refreshToken";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh))
            .route("/logout", web::post().to(logout))
            .route("/me", web::get().to(get_current_user)),
    );
}

fn refresh_cookie(state: &AppState, token: &str) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::seconds(state.tokens.refresh_ttl().num_seconds()))
        .finish()
}

fn removal_cookie(state: &AppState) -> Cookie<'static> {
    let mut cookie = refresh_cookie(state, "");
    cookie.make_removal();
    cookie
}

async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request.validate()?;

    let session = auth_service::signup(&state.db, &state.tokens, &request).await?;

    Ok(HttpResponse::Created()
        .cookie(refresh_cookie(&state, &session.refresh_token))
        .json(ApiSuccess::new(AuthResponse {
            user: session.user,
            access_token: session.access_token,
        })))
}

async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request.validate()?;

    // Every attempt takes a slot up front; only a successful login gives them back.
    let limiter_key = request.email.to_lowercase();
    if !state.login_rate_limiter.try_acquire(&limiter_key) {
        log::warn!("Login rate limit reached for {}", limiter_key);
        return Err(AppError::TooManyRequests(
            "Too many login attempts, please try again later".to_string(),
        ));
    }

    match auth_service::login(&state.db, &state.tokens, &request).await {
        Ok(session) => {
            state.login_rate_limiter.clear(&limiter_key);
            Ok(HttpResponse::Ok()
                .cookie(refresh_cookie(&state, &session.refresh_token))
                .json(ApiSuccess::new(AuthResponse {
                    user: session.user,
                    access_token: session.access_token,
                })))
        }
        Err(AuthError::InvalidCredentials) => {
            log::warn!("Failed login attempt for {}", limiter_key);
            Err(AuthError::InvalidCredentials.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Reads the refresh cookie, falling back to a `refreshToken` body field.
fn presented_refresh_token(req: &HttpRequest, body: Option<web::Json<RefreshRequest>>) -> Option<String> {
    req.cookie(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| body.and_then(|body| body.into_inner().refresh_token))
        .filter(|token| !token.is_empty())
}

async fn refresh(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
) -> Result<HttpResponse, AppError> {
    let presented = presented_refresh_token(&req, body)
        .ok_or_else(|| AppError::Unauthorized("Refresh token not provided".to_string()))?;

    let pair = auth_service::refresh(&state.db, &state.tokens, &presented).await?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(&state, &pair.refresh_token))
        .json(ApiSuccess::new(AccessTokenResponse {
            access_token: pair.access_token,
        })))
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;

    auth_service::logout(&state.db, &claims.user_id).await?;

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(&state))
        .json(ApiMessage::new("Logged out successfully")))
}

async fn get_current_user(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;

    let user = auth_service::get_current_user(&state.db, &claims.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiSuccess::new(UserResponse { user })))
}
