//! Derived figures computed on read: budget usage, savings progress,
//! pagination and report totals. Nothing here touches the database.

pub mod budget;
pub mod pagination;
pub mod report;
pub mod savings;

pub use budget::{budget_progress, usage, BudgetProgress, ItemProgress, Usage, UsageStatus};
pub use pagination::Pagination;
pub use report::{summarize, CategoryTotal, ReportSummary};
pub use savings::{savings_progress, time_remaining, TimeRemaining};

use rust_decimal::Decimal;
use thiserror::Error;

/// A running total left Decimal's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("amount total overflowed")]
pub struct AmountOverflow;

/// Sums amounts without panicking on overflow.
pub fn checked_sum<I>(amounts: I) -> Result<Decimal, AmountOverflow>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().try_fold(Decimal::ZERO, |total, amount| {
        total.checked_add(amount).ok_or(AmountOverflow)
    })
}

/// Rounds half up, the way `Math.round` does (`-2.5` -> `-2`, `2.5` -> `3`).
pub(crate) fn round_half_up(value: Decimal) -> Decimal {
    match value.checked_add(Decimal::new(5, 1)) {
        Some(shifted) => shifted.floor(),
        // only reachable at the very top of the range, where there is no fraction left
        None => value.floor(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn rounds_half_up() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        assert_eq!(round_half_up(d("2.5")), d("3"));
        assert_eq!(round_half_up(d("2.49")), d("2"));
        assert_eq!(round_half_up(d("-2.5")), d("-2"));
        assert_eq!(round_half_up(d("-2.51")), d("-3"));
        assert_eq!(round_half_up(Decimal::MAX), Decimal::MAX);
    }

    #[test]
    fn sums_until_overflow() {
        let d = |s: &str| Decimal::from_str(s).unwrap();
        assert_eq!(checked_sum([d("1.5"), d("-0.5"), d("4")]), Ok(d("5")));
        assert_eq!(checked_sum(Vec::new()), Ok(Decimal::ZERO));
        assert_eq!(checked_sum([Decimal::MAX, Decimal::ONE]), Err(AmountOverflow));
        assert_eq!(checked_sum([Decimal::MIN, -Decimal::ONE]), Err(AmountOverflow));
    }
}
