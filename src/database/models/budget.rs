use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::Category;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "budgetItems")]
    pub items: Vec<BudgetItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItem {
    pub id: i64,
    pub budget_id: i64,
    pub category_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub category: Category,
}

#[derive(Debug, Clone)]
pub struct NewBudget {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub items: Vec<NewBudgetItem>,
}

#[derive(Debug, Clone)]
pub struct NewBudgetItem {
    pub category_id: i64,
    pub amount: Decimal,
}
