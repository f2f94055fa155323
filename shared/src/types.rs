use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ============================================================================
// User Types
// ============================================================================

/// Public projection of a user account. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body fallback for clients that cannot send the refresh cookie.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

// ============================================================================
// Category Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: String,
    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 200, message = "Description must be at most 200 characters"))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_hex_color"))]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub category: Category,
}

/// Accepts `#RRGGBB` only.
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let digits = color.strip_prefix('#').unwrap_or("");
    if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(());
    }

    let mut error = ValidationError::new("hex_color");
    error.message = Some(Cow::Borrowed("Color must be a hex value like #FF6B6B"));
    Err(error)
}

// ============================================================================
// Expense Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub amount: f64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub payment_method: String,
    pub attachment_url: Option<String>,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    #[validate(range(exclusive_min = 0.0, message = "Amount must be positive"))]
    pub amount: f64,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    /// Defaults to the time of creation.
    pub date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: String,
    #[validate(url(message = "Attachment must be a valid URL"))]
    pub attachment_url: Option<String>,
    pub category_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    #[validate(range(exclusive_min = 0.0, message = "Amount must be positive"))]
    pub amount: Option<f64>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, message = "Payment method is required"))]
    pub payment_method: Option<String>,
    #[validate(url(message = "Attachment must be a valid URL"))]
    pub attachment_url: Option<String>,
    pub category_id: Option<Uuid>,
}

/// Query-string filters for listing expenses. All bounds are inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpensesResponse {
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseResponse {
    pub expense: Expense,
}

// ============================================================================
// Dashboard Types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_amount: f64,
    pub total_count: i64,
    pub period: Period,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category: Category,
    pub total_amount: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub summary: DashboardSummary,
    pub category_breakdown: Vec<CategoryBreakdown>,
    pub recent_expenses: Vec<Expense>,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub status: ResponseStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            errors: Some(errors),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    pub status: ResponseStatus,
    pub data: T,
}

impl<T> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            data,
        }
    }
}

/// Success envelope for operations that return no data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub status: ResponseStatus,
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_success_envelope() {
        let success = ApiSuccess::new("test data");
        assert_eq!(success.data, "test data");

        let json = serde_json::to_value(&success).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"], "test data");
    }

    #[test]
    fn test_api_error_omits_empty_field_errors() {
        let json = serde_json::to_value(ApiError::new("Invalid refresh token")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Invalid refresh token");
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn test_auth_response_uses_camel_case() {
        let response = AuthResponse {
            user: User {
                id: Uuid::new_v4(),
                email: "a@x.com".to_string(),
                name: "A".to_string(),
                created_at: Utc::now(),
            },
            access_token: "token".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["accessToken"], "token");
        assert!(json["user"].get("createdAt").is_some());
        assert!(json["user"].get("passwordHash").is_none());
    }

    #[test]
    fn test_refresh_request_accepts_missing_token() {
        let request: RefreshRequest = serde_json::from_str("{}").unwrap();
        assert!(request.refresh_token.is_none());

        let request: RefreshRequest = serde_json::from_str(r#"{"refreshToken":"abc"}"#).unwrap();
        assert_eq!(request.refresh_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_signup_validation() {
        let valid = SignupRequest {
            email: "a@x.com".to_string(),
            password: "pw123456".to_string(),
            name: "A".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = SignupRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            name: String::new(),
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("name"));
    }

    #[test]
    fn test_signup_name_bounds() {
        let mut request = SignupRequest {
            email: "a@x.com".to_string(),
            password: "pw123456".to_string(),
            name: "a".repeat(100),
        };
        assert!(request.validate().is_ok());

        request.name = "a".repeat(101);
        let errors = request.validate().unwrap_err();
        let name_errors = errors.field_errors()["name"];
        assert_eq!(
            name_errors[0].message.as_deref(),
            Some("Name must be between 1 and 100 characters")
        );
    }

    #[test]
    fn test_login_validation_allows_short_passwords() {
        let request = LoginRequest {
            email: "a@x.com".to_string(),
            password: "wrong".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_hex_color_validation() {
        assert!(validate_hex_color("#FF6B6B").is_ok());
        assert!(validate_hex_color("#aa96da").is_ok());
        assert!(validate_hex_color("FF6B6B").is_err());
        assert!(validate_hex_color("#FFF").is_err());
        assert!(validate_hex_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_create_expense_validation() {
        let request: CreateExpenseRequest = serde_json::from_value(serde_json::json!({
            "amount": 0.0,
            "description": "",
            "paymentMethod": "Card",
            "attachmentUrl": "not a url",
            "categoryId": Uuid::new_v4(),
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("amount"));
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("attachment_url"));
        assert!(!fields.contains_key("payment_method"));
    }

    #[test]
    fn test_expense_filter_from_camel_case() {
        let filter: ExpenseFilter = serde_json::from_value(serde_json::json!({
            "startDate": "2024-01-01T00:00:00Z",
            "minAmount": 10.5,
        }))
        .unwrap();

        assert!(filter.start_date.is_some());
        assert!(filter.end_date.is_none());
        assert_eq!(filter.min_amount, Some(10.5));
    }
}
