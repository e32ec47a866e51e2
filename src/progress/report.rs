use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::AmountOverflow;
use crate::database::models::Category;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: Option<i64>,
    pub name: String,
    pub color: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_expenses: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net: Decimal,
    pub by_category: Vec<CategoryTotal>,
}

pub const UNCATEGORIZED: &str = "Uncategorized";

/// Income is the sum of positive amounts, expenses the magnitude of the
/// negative ones. `by_category` holds net signed totals, largest outflow first.
pub fn summarize(rows: &[(Option<Category>, Decimal)]) -> Result<ReportSummary, AmountOverflow> {
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut groups: BTreeMap<Option<i64>, CategoryTotal> = BTreeMap::new();

    for (category, amount) in rows {
        if amount.is_sign_positive() {
            total_income = total_income.checked_add(*amount).ok_or(AmountOverflow)?;
        } else {
            total_expenses = total_expenses.checked_add(amount.abs()).ok_or(AmountOverflow)?;
        }

        let key = category.as_ref().map(|c| c.id);
        let entry = groups.entry(key).or_insert_with(|| CategoryTotal {
            category_id: key,
            name: category
                .as_ref()
                .map(|c| c.name.clone())
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            color: category.as_ref().and_then(|c| c.color.clone()),
            total: Decimal::ZERO,
        });
        entry.total = entry.total.checked_add(*amount).ok_or(AmountOverflow)?;
    }

    let mut by_category: Vec<CategoryTotal> = groups.into_values().collect();
    by_category.sort_by(|a, b| a.total.cmp(&b.total));

    Ok(ReportSummary {
        total_income,
        total_expenses,
        net: total_income
            .checked_sub(total_expenses)
            .ok_or(AmountOverflow)?,
        by_category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CategoryType;
    use chrono::Utc;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn cat(id: i64, name: &str) -> Category {
        Category {
            id,
            user_id: 1,
            name: name.into(),
            r#type: CategoryType::Expense,
            color: Some("#F87171".into()),
            icon: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn splits_income_and_expenses() {
        let food = cat(4, "Food");
        let rent = cat(3, "Housing");
        let rows = vec![
            (None, d("5250")),
            (Some(food.clone()), d("-45.20")),
            (Some(food), d("-4.80")),
            (Some(rent), d("-1200")),
        ];

        let summary = summarize(&rows).unwrap();
        assert_eq!(summary.total_income, d("5250"));
        assert_eq!(summary.total_expenses, d("1250"));
        assert_eq!(summary.net, d("4000"));

        let names: Vec<&str> = summary.by_category.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Housing", "Food", UNCATEGORIZED]);
        assert_eq!(summary.by_category[1].total, d("-50"));
        assert_eq!(summary.by_category[2].category_id, None);
    }

    #[test]
    fn overflowing_totals_are_an_error() {
        let food = cat(4, "Food");
        let rows = vec![
            (Some(food.clone()), Decimal::MIN),
            (Some(food), d("-1")),
        ];
        assert_eq!(summarize(&rows), Err(AmountOverflow));

        let income = vec![(None, Decimal::MAX), (None, Decimal::MAX)];
        assert_eq!(summarize(&income), Err(AmountOverflow));
    }

    #[test]
    fn empty_report() {
        let summary = summarize(&[]).unwrap();
        assert_eq!(summary.net, Decimal::ZERO);
        assert!(summary.by_category.is_empty());
    }
}
