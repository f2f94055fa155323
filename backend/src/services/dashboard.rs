use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc};
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use crate::services::categories::{self as category_service, CategoryError};
use crate::services::expenses::{self as expense_service, ExpenseError};
use shared::{CategoryBreakdown, DashboardQuery, DashboardStats, DashboardSummary, Period};

/// Number of expenses listed under `recentExpenses`.
pub const RECENT_EXPENSES_LIMIT: i64 = 10;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Start date must not be after end date")]
    InvalidPeriod,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Expense(#[from] ExpenseError),
    #[error("Corrupt dashboard record: {0}")]
    CorruptRecord(#[from] uuid::Error),
}

#[derive(Debug, FromRow)]
struct BreakdownRow {
    category_id: String,
    total_amount: f64,
    count: i64,
}

/// First instant and last millisecond of the UTC month containing `now`.
pub fn month_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let first_day = now.date_naive() - Duration::days(i64::from(now.day0()));
    let next_month = first_day + Months::new(1);

    let start = first_day.and_time(NaiveTime::MIN).and_utc();
    let end = next_month.and_time(NaiveTime::MIN).and_utc() - Duration::milliseconds(1);
    (start, end)
}

pub async fn get_dashboard_stats(
    pool: &SqlitePool,
    user_id: &Uuid,
    query: &DashboardQuery,
    now: DateTime<Utc>,
) -> Result<DashboardStats, DashboardError> {
    let (month_start, month_end) = month_bounds(now);
    let start = query.start_date.unwrap_or(month_start);
    let end = query.end_date.unwrap_or(month_end);

    if start > end {
        return Err(DashboardError::InvalidPeriod);
    }

    let (total_amount, total_count): (f64, i64) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(amount), 0.0), COUNT(*)
        FROM expenses
        WHERE user_id = ? AND date >= ? AND date <= ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;

    let rows: Vec<BreakdownRow> = sqlx::query_as(
        r#"
        SELECT category_id, SUM(amount) AS total_amount, COUNT(*) AS count
        FROM expenses
        WHERE user_id = ? AND date >= ? AND date <= ?
        GROUP BY category_id
        ORDER BY total_amount DESC
        "#,
    )
    .bind(user_id.to_string())
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    let categories = category_service::category_map(pool, user_id).await?;
    let mut category_breakdown = Vec::with_capacity(rows.len());
    for row in rows {
        let category_id = Uuid::parse_str(&row.category_id)?;
        match categories.get(&category_id) {
            Some(category) => category_breakdown.push(CategoryBreakdown {
                category: category.clone(),
                total_amount: row.total_amount,
                count: row.count,
            }),
            None => log::warn!("Dashboard skipped unknown category {}", category_id),
        }
    }

    let recent_expenses =
        expense_service::recent_expenses(pool, user_id, RECENT_EXPENSES_LIMIT).await?;

    Ok(DashboardStats {
        summary: DashboardSummary {
            total_amount,
            total_count,
            period: Period { start, end },
        },
        category_breakdown,
        recent_expenses,
    })
}
