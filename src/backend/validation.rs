//! Request schemas and the extractors that enforce them.
//!
//! `ValidJson<T>` / `ValidQuery<T>` deserialize the raw request and run
//! `validator` over it; any failure becomes a 400 with a field-level map
//! (`{"name": ["Name is required"]}`). The `into_*` conversions then apply
//! defaults and produce the typed values the query layer takes.

use std::borrow::Cow;
use std::collections::HashSet;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::backend::error::{ApiError, ApiResult};
use crate::database::models::{
    BudgetFilter, CategoryFilter, CategoryType, NewBudget, NewBudgetItem, NewCategory,
    NewSavingsGoal, NewTransaction, SavingsGoalChanges, TransactionFilter, TransactionKind,
};

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const MAX_PAGE: i64 = 1_000_000;
/// Largest magnitude accepted for any money field.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;
/// Money is kept to cents.
pub const MONEY_SCALE: u32 = 2;

/*==========Extractors=========== */

/// JSON body that has passed its schema.
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::field("body", &rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| ApiError::Validation(field_errors(&errors)))?;
        Ok(Self(value))
    }
}

/// Query string that has passed its schema.
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::field("query", &rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| ApiError::Validation(field_errors(&errors)))?;
        Ok(Self(value))
    }
}

/// Flattens validator output into `{"field": [messages]}`, with nested
/// paths like `budgetItems[0].amount` and camelCase names.
pub fn field_errors(errors: &ValidationErrors) -> Value {
    let mut out = Map::new();
    collect_errors(errors, "", &mut out);
    Value::Object(out)
}

fn collect_errors(errors: &ValidationErrors, prefix: &str, out: &mut Map<String, Value>) {
    for (field, kind) in errors.errors() {
        let path = format!("{}{}", prefix, camel_case(&field.to_string()));
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages: Vec<Value> = list
                    .iter()
                    .map(|e| {
                        let text = e.message.clone().unwrap_or_else(|| e.code.clone());
                        Value::String(text.into_owned())
                    })
                    .collect();
                out.insert(path, Value::Array(messages));
            }
            ValidationErrorsKind::Struct(inner) => {
                collect_errors(inner, &format!("{path}."), out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_errors(inner, &format!("{path}[{index}]."), out);
                }
            }
        }
    }
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/*==========Field rules=========== */

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (its calendar date is kept).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn valid_date(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule("required", "Date is required"));
    }
    match parse_date(value) {
        Some(_) => Ok(()),
        None => Err(rule("date", "Invalid date")),
    }
}

fn money(value: &Decimal) -> Result<(), ValidationError> {
    if value.abs() > Decimal::from(MAX_AMOUNT) {
        return Err(rule("money_range", "Must be at most 1000000000000000 in magnitude"));
    }
    if value.normalize().scale() > MONEY_SCALE {
        return Err(rule("money_scale", "Must have at most 2 decimal places"));
    }
    Ok(())
}

fn positive(value: &Decimal) -> Result<(), ValidationError> {
    money(value)?;
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(rule("positive", "Must be positive"))
    }
}

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    money(value)?;
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        Err(rule("non_negative", "Must not be negative"))
    }
}

fn date_field(field: &str, value: &str) -> ApiResult<NaiveDate> {
    parse_date(value).ok_or_else(|| ApiError::field(field, "Invalid date"))
}

fn optional_date(field: &str, value: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    value.map(|v| date_field(field, v)).transpose()
}

fn required<T>(field: &str, value: Option<T>, message: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::field(field, message))
}

/*==========Transaction schema=========== */

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[validate(required(message = "Amount is required"), custom(function = "money"))]
    pub amount: Option<Decimal>,
    #[serde(default)]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[serde(default)]
    #[validate(custom(function = "valid_date"))]
    pub date: String,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurring_id: Option<i64>,
}

impl TransactionPayload {
    pub fn into_new(self) -> ApiResult<NewTransaction> {
        Ok(NewTransaction {
            amount: required("amount", self.amount, "Amount is required")?,
            date: date_field("date", &self.date)?,
            description: self.description,
            category_id: self.category_id,
            is_recurring: self.is_recurring,
            recurring_id: self.recurring_id,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    #[validate(range(min = 1, max = 1_000_000, message = "Page must be between 1 and 1000000"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,
    pub category_id: Option<i64>,
    #[validate(custom(function = "valid_date"))]
    pub start_date: Option<String>,
    #[validate(custom(function = "valid_date"))]
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub search: Option<String>,
}

impl TransactionQuery {
    pub fn into_filter(self) -> ApiResult<TransactionFilter> {
        Ok(TransactionFilter {
            category_id: self.category_id,
            start_date: optional_date("startDate", self.start_date.as_deref())?,
            end_date: optional_date("endDate", self.end_date.as_deref())?,
            kind: self.kind,
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT),
        })
    }
}

/*==========Category schema=========== */

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(required(message = "Type must be INCOME or EXPENSE"))]
    pub kind: Option<CategoryType>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

impl CategoryPayload {
    pub fn into_new(self) -> ApiResult<NewCategory> {
        Ok(NewCategory {
            r#type: required("type", self.kind, "Type must be INCOME or EXPENSE")?,
            name: self.name,
            color: self.color,
            icon: self.icon,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CategoryQuery {
    #[serde(rename = "type")]
    pub kind: Option<CategoryType>,
}

impl CategoryQuery {
    pub fn into_filter(self) -> CategoryFilter {
        CategoryFilter { r#type: self.kind }
    }
}

/*==========Budget schema=========== */

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BudgetItemPayload {
    #[validate(required(message = "Category is required"))]
    pub category_id: Option<i64>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[validate(required(message = "Amount is required"), custom(function = "positive"))]
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BudgetPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "valid_date"))]
    pub start_date: String,
    #[serde(default)]
    #[validate(custom(function = "valid_date"))]
    pub end_date: String,
    #[validate(nested)]
    pub budget_items: Vec<BudgetItemPayload>,
}

impl BudgetPayload {
    /// Also rejects a range that ends before it starts and a category listed
    /// twice in the same budget.
    pub fn into_new(self) -> ApiResult<NewBudget> {
        let start_date = date_field("startDate", &self.start_date)?;
        let end_date = date_field("endDate", &self.end_date)?;
        if end_date < start_date {
            return Err(ApiError::field(
                "endDate",
                "End date must not be before start date",
            ));
        }

        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(self.budget_items.len());
        for item in self.budget_items {
            let category_id = required("budgetItems", item.category_id, "Category is required")?;
            if !seen.insert(category_id) {
                return Err(ApiError::field(
                    "budgetItems",
                    "Each category may appear only once",
                ));
            }
            items.push(NewBudgetItem {
                category_id,
                amount: required("budgetItems", item.amount, "Amount is required")?,
            });
        }

        Ok(NewBudget {
            name: self.name,
            start_date,
            end_date,
            items,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct BudgetQuery {
    pub current: Option<bool>,
}

impl BudgetQuery {
    pub fn into_filter(self, today: NaiveDate) -> BudgetFilter {
        BudgetFilter {
            active_on: self.current.unwrap_or(false).then_some(today),
        }
    }
}

/*==========Savings goal schema=========== */

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoalPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[validate(required(message = "Target amount is required"), custom(function = "positive"))]
    pub target_amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[validate(custom(function = "non_negative"))]
    pub current_amount: Option<Decimal>,
    #[validate(custom(function = "valid_date"))]
    pub target_date: Option<String>,
}

impl SavingsGoalPayload {
    pub fn into_new(self) -> ApiResult<NewSavingsGoal> {
        Ok(NewSavingsGoal {
            target_amount: required(
                "targetAmount",
                self.target_amount,
                "Target amount is required",
            )?,
            current_amount: self.current_amount.unwrap_or(Decimal::ZERO),
            target_date: optional_date("targetDate", self.target_date.as_deref())?,
            name: self.name,
        })
    }
}

/// PATCH body: `id` plus any subset of the create fields.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SavingsGoalPatch {
    pub id: Option<i64>,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[validate(custom(function = "positive"))]
    pub target_amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[validate(custom(function = "non_negative"))]
    pub current_amount: Option<Decimal>,
    #[validate(custom(function = "valid_date"))]
    pub target_date: Option<String>,
}

impl SavingsGoalPatch {
    pub fn into_changes(self) -> ApiResult<(i64, SavingsGoalChanges)> {
        let id = self
            .id
            .ok_or_else(|| ApiError::BadRequest("Savings goal ID is required".into()))?;
        Ok((
            id,
            SavingsGoalChanges {
                name: self.name,
                target_amount: self.target_amount,
                current_amount: self.current_amount,
                target_date: optional_date("targetDate", self.target_date.as_deref())?,
            },
        ))
    }
}

/*==========Report schema=========== */

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[validate(custom(function = "valid_date"))]
    pub start_date: Option<String>,
    #[validate(custom(function = "valid_date"))]
    pub end_date: Option<String>,
}

impl ReportQuery {
    pub fn into_range(self) -> ApiResult<(Option<NaiveDate>, Option<NaiveDate>)> {
        Ok((
            optional_date("startDate", self.start_date.as_deref())?,
            optional_date("endDate", self.end_date.as_deref())?,
        ))
    }
}

/*==========Auth schema=========== */

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[serde(default)]
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Emails are matched case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
