use chrono::NaiveDate;
use serde::Deserialize;

use super::CategoryType;

/// Sign of a transaction amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    pub category_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
    pub search: Option<String>,
    /// 1-based
    pub page: i64,
    pub limit: i64,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            category_id: None,
            start_date: None,
            end_date: None,
            kind: None,
            search: None,
            page: 1,
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BudgetFilter {
    /// Only budgets whose range contains this day.
    pub active_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryFilter {
    pub r#type: Option<CategoryType>,
}
