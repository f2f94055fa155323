use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::CategoryRow;
use shared::{Category, CreateCategoryRequest, UpdateCategoryRequest};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Category not found")]
    NotFound,
    #[error("Category with this name already exists")]
    DuplicateName,
    #[error("Cannot delete category with associated expenses")]
    HasExpenses,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Corrupt category record: {0}")]
    CorruptRecord(#[from] uuid::Error),
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed"))
}

async fn fetch_owned(
    pool: &SqlitePool,
    user_id: &Uuid,
    category_id: &Uuid,
) -> Result<Option<CategoryRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM categories WHERE id = ? AND user_id = ?")
        .bind(category_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(pool)
        .await
}

pub async fn list_categories(
    pool: &SqlitePool,
    user_id: &Uuid,
) -> Result<Vec<Category>, CategoryError> {
    let rows: Vec<CategoryRow> =
        sqlx::query_as("SELECT * FROM categories WHERE user_id = ? ORDER BY created_at DESC")
            .bind(user_id.to_string())
            .fetch_all(pool)
            .await?;

    rows.iter()
        .map(|row| row.to_shared().map_err(CategoryError::from))
        .collect()
}

/// All of a user's categories keyed by id, for embedding into expenses.
pub async fn category_map(
    pool: &SqlitePool,
    user_id: &Uuid,
) -> Result<HashMap<Uuid, Category>, CategoryError> {
    Ok(list_categories(pool, user_id)
        .await?
        .into_iter()
        .map(|category| (category.id, category))
        .collect())
}

pub async fn get_category(
    pool: &SqlitePool,
    user_id: &Uuid,
    category_id: &Uuid,
) -> Result<Category, CategoryError> {
    let row = fetch_owned(pool, user_id, category_id)
        .await?
        .ok_or(CategoryError::NotFound)?;

    Ok(row.to_shared()?)
}

pub async fn create_category(
    pool: &SqlitePool,
    user_id: &Uuid,
    request: &CreateCategoryRequest,
) -> Result<Category, CategoryError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO categories (id, user_id, name, description, color, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id.to_string())
    .bind(&request.name)
    .bind(&request.description)
    .bind(&request.color)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(Category {
            id,
            user_id: *user_id,
            name: request.name.clone(),
            description: request.description.clone(),
            color: request.color.clone(),
            created_at: now,
            updated_at: now,
        }),
        Err(e) if is_unique_violation(&e) => Err(CategoryError::DuplicateName),
        Err(e) => Err(CategoryError::DatabaseError(e)),
    }
}

pub async fn update_category(
    pool: &SqlitePool,
    user_id: &Uuid,
    category_id: &Uuid,
    request: &UpdateCategoryRequest,
) -> Result<Category, CategoryError> {
    let mut category = fetch_owned(pool, user_id, category_id)
        .await?
        .ok_or(CategoryError::NotFound)?;

    if let Some(ref name) = request.name {
        category.name = name.clone();
    }
    if let Some(ref description) = request.description {
        category.description = Some(description.clone());
    }
    if let Some(ref color) = request.color {
        category.color = Some(color.clone());
    }
    category.updated_at = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE categories
        SET name = ?, description = ?, color = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.color)
    .bind(category.updated_at)
    .bind(category_id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(category.to_shared()?),
        Err(e) if is_unique_violation(&e) => Err(CategoryError::DuplicateName),
        Err(e) => Err(CategoryError::DatabaseError(e)),
    }
}

pub async fn delete_category(
    pool: &SqlitePool,
    user_id: &Uuid,
    category_id: &Uuid,
) -> Result<(), CategoryError> {
    if fetch_owned(pool, user_id, category_id).await?.is_none() {
        return Err(CategoryError::NotFound);
    }

    let expenses = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM expenses WHERE category_id = ?")
        .bind(category_id.to_string())
        .fetch_one(pool)
        .await?;

    if expenses > 0 {
        return Err(CategoryError::HasExpenses);
    }

    let result = sqlx::query("DELETE FROM categories WHERE id = ? AND user_id = ?")
        .bind(category_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => Err(CategoryError::NotFound),
        Ok(_) => Ok(()),
        // An expense added between the count and the delete trips the foreign key.
        Err(sqlx::Error::Database(e)) if e.message().contains("FOREIGN KEY constraint failed") => {
            Err(CategoryError::HasExpenses)
        }
        Err(e) => Err(CategoryError::DatabaseError(e)),
    }
}
