use std::fmt::Debug;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use shared::{ApiError, FieldError};
use thiserror::Error;
use validator::ValidationErrors;

use crate::middleware::auth::AuthMiddlewareError;
use crate::services::auth::AuthError;
use crate::services::categories::CategoryError;
use crate::services::dashboard::DashboardError;
use crate::services::expenses::ExpenseError;

/// Error taxonomy exposed over HTTP. Every variant maps to one status code
/// and renders the `{status: "error", message, errors?}` envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    TooManyRequests(String),
    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Logs the underlying cause and hides it from the client.
    pub fn internal(context: &str, cause: impl Debug) -> Self {
        log::error!("{}: {:?}", context, cause);
        AppError::Internal
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation(errors) => ApiError::with_errors(self.to_string(), errors.clone()),
            _ => ApiError::new(self.to_string()),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// `payment_method` -> `paymentMethod`, matching the JSON field names.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = camel_case(&field);
                errors.iter().map(move |e| FieldError {
                    field: field.clone(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::Validation(fields)
    }
}

impl From<AuthMiddlewareError> for AppError {
    fn from(e: AuthMiddlewareError) -> Self {
        AppError::Unauthorized(e.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::EmailTaken => AppError::Conflict(e.to_string()),
            AuthError::InvalidCredentials | AuthError::InvalidRefreshToken => {
                AppError::Unauthorized(e.to_string())
            }
            AuthError::UserNotFound => AppError::NotFound(e.to_string()),
            other => AppError::internal("Auth error", other),
        }
    }
}

impl From<CategoryError> for AppError {
    fn from(e: CategoryError) -> Self {
        match e {
            CategoryError::NotFound => AppError::NotFound(e.to_string()),
            CategoryError::DuplicateName => AppError::Conflict(e.to_string()),
            CategoryError::HasExpenses => AppError::BadRequest(e.to_string()),
            other => AppError::internal("Category error", other),
        }
    }
}

impl From<ExpenseError> for AppError {
    fn from(e: ExpenseError) -> Self {
        match e {
            ExpenseError::NotFound | ExpenseError::CategoryNotFound => {
                AppError::NotFound(e.to_string())
            }
            other => AppError::internal("Expense error", other),
        }
    }
}

impl From<DashboardError> for AppError {
    fn from(e: DashboardError) -> Self {
        match e {
            DashboardError::InvalidPeriod => AppError::field("startDate", e.to_string()),
            DashboardError::Category(e) => e.into(),
            DashboardError::Expense(e) => e.into(),
            other => AppError::internal("Dashboard error", other),
        }
    }
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::field("body", err.to_string()).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::field("query", err.to_string()).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("Rejected path: {}", err);
    AppError::BadRequest("Invalid ID format".to_string()).into()
}
