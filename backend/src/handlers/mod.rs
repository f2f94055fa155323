use actix_web::{web, HttpResponse};
use chrono::Utc;
use shared::{HealthResponse, ResponseStatus};

use crate::error::{json_error_handler, path_error_handler, query_error_handler};

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod expenses;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(
            web::scope("/api/v1")
                .route("/health", web::get().to(health))
                .configure(auth::configure)
                .configure(categories::configure)
                .configure(expenses::configure)
                .configure(dashboard::configure),
        );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: ResponseStatus::Success,
        message: "Server is running".to_string(),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().configure(configure_routes)).await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "success");
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn test_unknown_route() {
        let app = test::init_service(App::new().configure(configure_routes)).await;

        let req = test::TestRequest::get().uri("/api/v1/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
