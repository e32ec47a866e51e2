use std::fmt;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use super::round_half_up;

/// Percentage of `target` reached by `current`, rounded and capped at 100.
pub fn savings_progress(current: Decimal, target: Decimal) -> i64 {
    if target <= Decimal::ZERO {
        return if current > Decimal::ZERO { 100 } else { 0 };
    }
    let Some(raw) = current
        .checked_div(target)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    else {
        return if current > Decimal::ZERO { 100 } else { 0 };
    };
    round_half_up(raw).min(Decimal::ONE_HUNDRED).to_i64().unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    NoTargetDate,
    PastDue,
    Days(i64),
    Months(i64),
    Years { years: i64, months: i64 },
}

const DAYS_PER_MONTH: i64 = 30;
const DAYS_PER_YEAR: i64 = 365;

pub fn time_remaining(target: Option<NaiveDate>, today: NaiveDate) -> TimeRemaining {
    let Some(target) = target else {
        return TimeRemaining::NoTargetDate;
    };
    if target < today {
        return TimeRemaining::PastDue;
    }

    let days = (target - today).num_days();
    if days < DAYS_PER_MONTH {
        TimeRemaining::Days(days)
    } else if days < DAYS_PER_YEAR {
        TimeRemaining::Months(days / DAYS_PER_MONTH)
    } else {
        TimeRemaining::Years {
            years: days / DAYS_PER_YEAR,
            months: (days % DAYS_PER_YEAR) / DAYS_PER_MONTH,
        }
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTargetDate => f.write_str("no target date"),
            Self::PastDue => f.write_str("past due"),
            Self::Days(days) => write!(f, "{} left", plural(*days, "day")),
            Self::Months(months) => write!(f, "{} left", plural(*months, "month")),
            Self::Years { years, months: 0 } => write!(f, "{} left", plural(*years, "year")),
            Self::Years { years, months } => write!(
                f,
                "{}, {} left",
                plural(*years, "year"),
                plural(*months, "month")
            ),
        }
    }
}

impl Serialize for TimeRemaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day(y: i32, m: u32, dd: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, dd).unwrap()
    }

    #[test]
    fn progress_rounds_and_caps() {
        assert_eq!(savings_progress(d("0"), d("1000")), 0);
        assert_eq!(savings_progress(d("333"), d("1000")), 33);
        assert_eq!(savings_progress(d("335"), d("1000")), 34);
        assert_eq!(savings_progress(d("1000"), d("1000")), 100);
        assert_eq!(savings_progress(d("2500"), d("1000")), 100);
    }

    #[test]
    fn extreme_ratios_stay_in_range() {
        assert_eq!(savings_progress(Decimal::MAX, Decimal::new(1, 20)), 100);
        assert_eq!(savings_progress(d("0.01"), Decimal::MAX), 0);
    }

    #[test]
    fn progress_is_monotonic_in_current() {
        let target = d("750");
        let mut last = 0;
        for step in 0..=200 {
            let current = Decimal::from(step) * d("5.5");
            let p = savings_progress(current, target);
            assert!(p >= last, "progress dropped at {current}");
            last = p;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn time_remaining_wording() {
        let today = day(2024, 1, 1);
        let in_days = |n: i64| Some(today + chrono::Duration::days(n));

        assert_eq!(time_remaining(None, today).to_string(), "no target date");
        assert_eq!(time_remaining(Some(day(2023, 12, 31)), today).to_string(), "past due");
        assert_eq!(time_remaining(in_days(0), today).to_string(), "0 days left");
        assert_eq!(time_remaining(in_days(1), today).to_string(), "1 day left");
        assert_eq!(time_remaining(in_days(10), today).to_string(), "10 days left");
        assert_eq!(time_remaining(in_days(29), today).to_string(), "29 days left");
        assert_eq!(time_remaining(in_days(30), today).to_string(), "1 month left");
        assert_eq!(time_remaining(in_days(40), today).to_string(), "1 month left");
        assert_eq!(time_remaining(in_days(90), today).to_string(), "3 months left");
        assert_eq!(time_remaining(in_days(364), today).to_string(), "12 months left");
        assert_eq!(time_remaining(in_days(365), today).to_string(), "1 year left");
        assert_eq!(time_remaining(in_days(400), today).to_string(), "1 year, 1 month left");
        assert_eq!(time_remaining(in_days(800), today).to_string(), "2 years, 2 months left");
    }

    #[test]
    fn serializes_as_text() {
        let json = serde_json::to_string(&TimeRemaining::Days(3)).unwrap();
        assert_eq!(json, "\"3 days left\"");
    }
}
