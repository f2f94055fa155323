use actix_web::{web, HttpRequest, HttpResponse};
use shared::{
    ApiMessage, ApiSuccess, CategoriesResponse, CategoryResponse, CreateCategoryRequest,
    UpdateCategoryRequest,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::middleware::auth::extract_claims;
use crate::models::AppState;
use crate::services::categories as category_service;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .route("", web::get().to(list_categories))
            .route("", web::post().to(create_category))
            .route("/{category_id}", web::get().to(get_category))
            .route("/{category_id}", web::put().to(update_category))
            .route("/{category_id}", web::delete().to(delete_category)),
    );
}

async fn list_categories(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;

    let categories = category_service::list_categories(&state.db, &claims.user_id).await?;

    Ok(HttpResponse::Ok().json(ApiSuccess::new(CategoriesResponse { categories })))
}

async fn create_category(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;
    let request = body.into_inner();
    request.validate()?;

    let category = category_service::create_category(&state.db, &claims.user_id, &request).await?;

    Ok(HttpResponse::Created().json(ApiSuccess::new(CategoryResponse { category })))
}

async fn get_category(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;

    let category =
        category_service::get_category(&state.db, &claims.user_id, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiSuccess::new(CategoryResponse { category })))
}

async fn update_category(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;
    let request = body.into_inner();
    request.validate()?;

    let category = category_service::update_category(
        &state.db,
        &claims.user_id,
        &path.into_inner(),
        &request,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ApiSuccess::new(CategoryResponse { category })))
}

async fn delete_category(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let claims = extract_claims(&req, &state.tokens)?;

    category_service::delete_category(&state.db, &claims.user_id, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiMessage::new("Category deleted successfully")))
}
