use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for expenses
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExpenseRow {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub amount: f64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub payment_method: String,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpenseRow {
    /// Builds the wire type; `category` must be the row's own category.
    pub fn to_shared(&self, category: shared::Category) -> Result<shared::Expense, uuid::Error> {
        Ok(shared::Expense {
            id: Uuid::parse_str(&self.id)?,
            user_id: Uuid::parse_str(&self.user_id)?,
            category_id: Uuid::parse_str(&self.category_id)?,
            amount: self.amount,
            description: self.description.clone(),
            date: self.date,
            payment_method: self.payment_method.clone(),
            attachment_url: self.attachment_url.clone(),
            category,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_row_to_shared() {
        let now = Utc::now();
        let user_id = Uuid::new_v4();
        let category = shared::Category {
            id: Uuid::new_v4(),
            user_id,
            name: "Transportation".to_string(),
            description: None,
            color: None,
            created_at: now,
            updated_at: now,
        };

        let row = ExpenseRow {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category_id: category.id.to_string(),
            amount: 60.0,
            description: "Gas station fill-up".to_string(),
            date: now,
            payment_method: "Debit Card".to_string(),
            attachment_url: None,
            created_at: now,
            updated_at: now,
        };

        let shared = row.to_shared(category.clone()).unwrap();

        assert_eq!(shared.category_id, category.id);
        assert_eq!(shared.category, category);
        assert_eq!(shared.amount, 60.0);
        assert_eq!(shared.payment_method, "Debit Card");
    }
}
