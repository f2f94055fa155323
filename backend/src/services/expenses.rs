use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::ExpenseRow;
use crate::services::categories::{self as category_service, CategoryError};
use shared::{CreateExpenseRequest, Expense, ExpenseFilter, UpdateExpenseRequest};

#[derive(Debug, Error)]
pub enum ExpenseError {
    #[error("Expense not found")]
    NotFound,
    #[error("Category not found")]
    CategoryNotFound,
    #[error("Expense {0} references a missing category")]
    DanglingCategory(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Corrupt expense record: {0}")]
    CorruptRecord(#[from] uuid::Error),
}

impl From<CategoryError> for ExpenseError {
    fn from(e: CategoryError) -> Self {
        match e {
            CategoryError::DatabaseError(e) => ExpenseError::DatabaseError(e),
            CategoryError::CorruptRecord(e) => ExpenseError::CorruptRecord(e),
            _ => ExpenseError::CategoryNotFound,
        }
    }
}

/// Embeds each row's category, loading the owner's categories once.
pub async fn with_categories(
    pool: &SqlitePool,
    user_id: &Uuid,
    rows: Vec<ExpenseRow>,
) -> Result<Vec<Expense>, ExpenseError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let categories = category_service::category_map(pool, user_id).await?;

    rows.iter()
        .map(|row| -> Result<Expense, ExpenseError> {
            let category_id = Uuid::parse_str(&row.category_id)?;
            let category = categories
                .get(&category_id)
                .cloned()
                .ok_or_else(|| ExpenseError::DanglingCategory(row.id.clone()))?;
            Ok(row.to_shared(category)?)
        })
        .collect()
}

async fn fetch_owned(
    pool: &SqlitePool,
    user_id: &Uuid,
    expense_id: &Uuid,
) -> Result<Option<ExpenseRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM expenses WHERE id = ? AND user_id = ?")
        .bind(expense_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn list_expenses(
    pool: &SqlitePool,
    user_id: &Uuid,
    filter: &ExpenseFilter,
) -> Result<Vec<Expense>, ExpenseError> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM expenses WHERE user_id = ");
    query.push_bind(user_id.to_string());

    if let Some(category_id) = filter.category_id {
        query.push(" AND category_id = ").push_bind(category_id.to_string());
    }
    if let Some(start) = filter.start_date {
        query.push(" AND date >= ").push_bind(start);
    }
    if let Some(end) = filter.end_date {
        query.push(" AND date <= ").push_bind(end);
    }
    if let Some(min) = filter.min_amount {
        query.push(" AND amount >= ").push_bind(min);
    }
    if let Some(max) = filter.max_amount {
        query.push(" AND amount <= ").push_bind(max);
    }
    query.push(" ORDER BY date DESC, created_at DESC");

    let rows: Vec<ExpenseRow> = query.build_query_as().fetch_all(pool).await?;

    with_categories(pool, user_id, rows).await
}

pub async fn recent_expenses(
    pool: &SqlitePool,
    user_id: &Uuid,
    limit: i64,
) -> Result<Vec<Expense>, ExpenseError> {
    let rows: Vec<ExpenseRow> = sqlx::query_as(
        "SELECT * FROM expenses WHERE user_id = ? ORDER BY date DESC, created_at DESC LIMIT ?",
    )
    .bind(user_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    with_categories(pool, user_id, rows).await
}

pub async fn get_expense(
    pool: &SqlitePool,
    user_id: &Uuid,
    expense_id: &Uuid,
) -> Result<Expense, ExpenseError> {
    let row = fetch_owned(pool, user_id, expense_id)
        .await?
        .ok_or(ExpenseError::NotFound)?;

    let category_id = Uuid::parse_str(&row.category_id)?;
    let category = category_service::get_category(pool, user_id, &category_id)
        .await
        .map_err(|e| match e {
            CategoryError::NotFound => ExpenseError::DanglingCategory(row.id.clone()),
            other => other.into(),
        })?;

    Ok(row.to_shared(category)?)
}

pub async fn create_expense(
    pool: &SqlitePool,
    user_id: &Uuid,
    request: &CreateExpenseRequest,
) -> Result<Expense, ExpenseError> {
    let category = category_service::get_category(pool, user_id, &request.category_id).await?;

    let now = Utc::now();
    let row = ExpenseRow {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        category_id: category.id.to_string(),
        amount: request.amount,
        description: request.description.clone(),
        date: request.date.unwrap_or(now),
        payment_method: request.payment_method.clone(),
        attachment_url: request.attachment_url.clone(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO expenses (id, user_id, category_id, amount, description, date, payment_method, attachment_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&row.id)
    .bind(&row.user_id)
    .bind(&row.category_id)
    .bind(row.amount)
    .bind(&row.description)
    .bind(row.date)
    .bind(&row.payment_method)
    .bind(&row.attachment_url)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(pool)
    .await?;

    Ok(row.to_shared(category)?)
}

pub async fn update_expense(
    pool: &SqlitePool,
    user_id: &Uuid,
    expense_id: &Uuid,
    request: &UpdateExpenseRequest,
) -> Result<Expense, ExpenseError> {
    let mut row = fetch_owned(pool, user_id, expense_id)
        .await?
        .ok_or(ExpenseError::NotFound)?;

    let category_id = match request.category_id {
        Some(id) => id,
        None => Uuid::parse_str(&row.category_id)?,
    };
    let category = category_service::get_category(pool, user_id, &category_id).await?;

    row.category_id = category.id.to_string();
    if let Some(amount) = request.amount {
        row.amount = amount;
    }
    if let Some(ref description) = request.description {
        row.description = description.clone();
    }
    if let Some(date) = request.date {
        row.date = date;
    }
    if let Some(ref payment_method) = request.payment_method {
        row.payment_method = payment_method.clone();
    }
    if let Some(ref attachment_url) = request.attachment_url {
        row.attachment_url = Some(attachment_url.clone());
    }
    row.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE expenses
        SET category_id = ?, amount = ?, description = ?, date = ?, payment_method = ?, attachment_url = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&row.category_id)
    .bind(row.amount)
    .bind(&row.description)
    .bind(row.date)
    .bind(&row.payment_method)
    .bind(&row.attachment_url)
    .bind(row.updated_at)
    .bind(&row.id)
    .bind(&row.user_id)
    .execute(pool)
    .await?;

    Ok(row.to_shared(category)?)
}

pub async fn delete_expense(
    pool: &SqlitePool,
    user_id: &Uuid,
    expense_id: &Uuid,
) -> Result<(), ExpenseError> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND user_id = ?")
        .bind(expense_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ExpenseError::NotFound);
    }

    Ok(())
}
