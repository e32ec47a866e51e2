use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::Category;

// amount is signed: expenses are negative, income positive
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
    pub category: Option<Category>,
    pub is_recurring: bool,
    pub recurring_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
    pub is_recurring: bool,
    pub recurring_id: Option<i64>,
}
