use std::collections::HashMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{checked_sum, round_half_up, AmountOverflow};
use crate::database::models::{Budget, CategoryType};

/// Display band for a spent/budgeted pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageStatus {
    Normal,
    Warning,
    Over,
}

/// `percent` is the rounded, uncapped figure shown as text; `bar_width` is
/// the same ratio clamped to `[0, 100]` for the progress bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub percent: Option<i64>,
    pub bar_width: f64,
    pub status: UsageStatus,
}

/// Usage of `budgeted` given `spent`.
///
/// A zero (or negative) allocation has no meaningful ratio: anything spent
/// against it is over budget with no percentage, nothing spent is 0%.
pub fn usage(spent: Decimal, budgeted: Decimal) -> Usage {
    if budgeted <= Decimal::ZERO {
        return if spent > Decimal::ZERO {
            Usage {
                percent: None,
                bar_width: 100.0,
                status: UsageStatus::Over,
            }
        } else {
            Usage {
                percent: Some(0),
                bar_width: 0.0,
                status: UsageStatus::Normal,
            }
        };
    }

    let scaled = spent.checked_div(budgeted).and_then(|ratio| {
        ratio
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|raw| (ratio, raw))
    });
    // ratio beyond Decimal's range
    let Some((ratio, raw)) = scaled else {
        return if spent > Decimal::ZERO {
            Usage {
                percent: None,
                bar_width: 100.0,
                status: UsageStatus::Over,
            }
        } else {
            Usage {
                percent: None,
                bar_width: 0.0,
                status: UsageStatus::Normal,
            }
        };
    };

    let status = if spent > budgeted {
        UsageStatus::Over
    } else if ratio > Decimal::new(8, 1) {
        UsageStatus::Warning
    } else {
        UsageStatus::Normal
    };

    Usage {
        percent: round_half_up(raw).to_i64(),
        bar_width: raw
            .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0),
        status,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemProgress {
    pub item_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub spent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining: Decimal,
    #[serde(flatten)]
    pub usage: Usage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_budgeted: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_spent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub remaining: Decimal,
    #[serde(flatten)]
    pub usage: Usage,
    #[serde(skip)]
    pub items: Vec<ItemProgress>,
}

/// Amount counted as "spent" against a category from its net signed total.
///
/// Expenses are stored negative, so an EXPENSE category's spending is the
/// negated net (refunds reduce it). INCOME categories track money received.
pub fn spent_for(category_type: CategoryType, net: Decimal) -> Decimal {
    match category_type {
        CategoryType::Expense => -net,
        CategoryType::Income => net,
    }
}

/// Progress for `budget`, given the net transaction amount per category id
/// over the budget's date range.
pub fn budget_progress(
    budget: &Budget,
    net_by_category: &HashMap<i64, Decimal>,
) -> Result<BudgetProgress, AmountOverflow> {
    let items = budget
        .items
        .iter()
        .map(|item| {
            let net = net_by_category
                .get(&item.category_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let spent = spent_for(item.category.r#type, net);
            Ok(ItemProgress {
                item_id: item.id,
                spent,
                remaining: item.amount.checked_sub(spent).ok_or(AmountOverflow)?,
                usage: usage(spent, item.amount),
            })
        })
        .collect::<Result<Vec<ItemProgress>, AmountOverflow>>()?;

    let total_budgeted = checked_sum(budget.items.iter().map(|i| i.amount))?;
    let total_spent = checked_sum(items.iter().map(|i| i.spent))?;

    Ok(BudgetProgress {
        total_budgeted,
        total_spent,
        remaining: total_budgeted
            .checked_sub(total_spent)
            .ok_or(AmountOverflow)?,
        usage: usage(total_spent, total_budgeted),
        items,
    })
}
