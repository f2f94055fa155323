use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use shared::{ApiSuccess, DashboardQuery};

use crate::error::AppError;
use crate::middleware::auth::extract_claims;
use crate::models::AppState;
use crate::services::dashboard as dashboard_service;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/dashboard").route("", web::get().to(get_stats)));
}

async fn get_stats(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;

    let stats =
        dashboard_service::get_dashboard_stats(&state.db, &claims.user_id, &query, Utc::now())
            .await?;

    Ok(HttpResponse::Ok().json(ApiSuccess::new(stats)))
}
