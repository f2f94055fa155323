use actix_web::{web, HttpRequest, HttpResponse};
use shared::{
    ApiMessage, ApiSuccess, CreateExpenseRequest, ExpenseFilter, ExpenseResponse,
    ExpensesResponse, UpdateExpenseRequest,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::auth::extract_claims;
use crate::models::AppState;
use crate::services::expenses as expense_service;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/expenses")
            .route("", web::get().to(list_expenses))
            .route("", web::post().to(create_expense))
            .route("/{expense_id}", web::get().to(get_expense))
            .route("/{expense_id}", web::put().to(update_expense))
            .route("/{expense_id}", web::delete().to(delete_expense)),
    );
}

fn validate_filter(filter: &ExpenseFilter) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(AppError::field("startDate", "Start date must not be after end date"));
        }
    }
    if let (Some(min), Some(max)) = (filter.min_amount, filter.max_amount) {
        if min > max {
            return Err(AppError::field("minAmount", "Minimum amount must not exceed maximum amount"));
        }
    }
    Ok(())
}

async fn list_expenses(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ExpenseFilter>,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;
    let filter = query.into_inner();
    validate_filter(&filter)?;

    let expenses = expense_service::list_expenses(&state.db, &claims.user_id, &filter).await?;

    Ok(HttpResponse::Ok().json(ApiSuccess::new(ExpensesResponse { expenses })))
}

async fn create_expense(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateExpenseRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;
    let request = body.into_inner();
    request.validate()?;

    let expense = expense_service::create_expense(&state.db, &claims.user_id, &request).await?;

    Ok(HttpResponse::Created().json(ApiSuccess::new(ExpenseResponse { expense })))
}

async fn get_expense(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;

    let expense =
        expense_service::get_expense(&state.db, &claims.user_id, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiSuccess::new(ExpenseResponse { expense })))
}

async fn update_expense(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateExpenseRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;
    let request = body.into_inner();
    request.validate()?;

    let expense =
        expense_service::update_expense(&state.db, &claims.user_id, &path.into_inner(), &request)
            .await?;

    Ok(HttpResponse::Ok().json(ApiSuccess::new(ExpenseResponse { expense })))
}

async fn delete_expense(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;

    expense_service::delete_expense(&state.db, &claims.user_id, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiMessage::new("Expense deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{bearer, create_test_category, create_test_user, test_app_state};
    use actix_web::http::{header::AUTHORIZATION, StatusCode};
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_validate_filter() {
        assert!(validate_filter(&ExpenseFilter::default()).is_ok());

        let inverted = ExpenseFilter {
            min_amount: Some(50.0),
            max_amount: Some(10.0),
            ..Default::default()
        };
        assert!(matches!(validate_filter(&inverted), Err(AppError::Validation(_))));
    }

    #[actix_web::test]
    async fn test_expense_lifecycle_over_http() {
        let state = test_app_state().await;
        let user_id = create_test_user(&state.db, "a@x.com").await;
        let food = create_test_category(&state.db, &user_id, "Food").await;
        let auth = bearer(&state.tokens, user_id, "a@x.com");
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(crate::handlers::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/expenses")
            .insert_header((AUTHORIZATION, auth.clone()))
            .set_json(json!({
                "amount": 45.5,
                "description": "Groceries",
                "date": "2024-03-02T09:00:00Z",
                "paymentMethod": "Card",
                "categoryId": food,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let id = body["data"]["expense"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["expense"]["category"]["name"], "Food");

        let req = test::TestRequest::get()
            .uri("/api/v1/expenses?minAmount=40&startDate=2024-03-01T00:00:00Z")
            .insert_header((AUTHORIZATION, auth.clone()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["expenses"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/v1/expenses?minAmount=50")
            .insert_header((AUTHORIZATION, auth.clone()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"]["expenses"].as_array().unwrap().is_empty());

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/expenses/{}", id))
            .insert_header((AUTHORIZATION, auth.clone()))
            .set_json(json!({"amount": 50.0}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["expense"]["amount"], 50.0);
        assert_eq!(body["data"]["expense"]["description"], "Groceries");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/expenses/{}", id))
            .insert_header((AUTHORIZATION, auth.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/expenses/{}", id))
            .insert_header((AUTHORIZATION, auth))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_expense_rejections() {
        let state = test_app_state().await;
        let user_id = create_test_user(&state.db, "a@x.com").await;
        let auth = bearer(&state.tokens, user_id, "a@x.com");
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .configure(crate::handlers::configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/expenses")
            .insert_header((AUTHORIZATION, auth.clone()))
            .set_json(json!({
                "amount": -1.0,
                "description": "",
                "paymentMethod": "Cash",
                "categoryId": Uuid::new_v4(),
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["amount", "description"]);

        let req = test::TestRequest::post()
            .uri("/api/v1/expenses")
            .insert_header((AUTHORIZATION, auth.clone()))
            .set_json(json!({
                "amount": 1.0,
                "description": "Coffee",
                "paymentMethod": "Cash",
                "categoryId": Uuid::new_v4(),
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Category not found");

        let req = test::TestRequest::get()
            .uri("/api/v1/expenses?startDate=2024-03-02T00:00:00Z&endDate=2024-03-01T00:00:00Z")
            .insert_header((AUTHORIZATION, auth.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/v1/expenses?minAmount=lots")
            .insert_header((AUTHORIZATION, auth))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["errors"][0]["field"], "query");
    }
}
