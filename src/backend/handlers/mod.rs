pub mod auth;
pub mod budgets;
pub mod categories;
pub mod reports;
pub mod savings_goals;
pub mod transactions;

use chrono::{NaiveDate, Utc};

/// Calendar day used for "current" budgets and time remaining.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
