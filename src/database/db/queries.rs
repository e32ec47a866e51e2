use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Pool, Row, Sqlite};

use crate::database::models::{
    Budget, BudgetFilter, BudgetItem, Category, CategoryFilter, CategoryType, NewBudget,
    NewCategory, NewSavingsGoal, NewTransaction, SavingsGoal, SavingsGoalChanges, Transaction,
    TransactionFilter, User,
};
use crate::progress::{AmountOverflow, Pagination};

/*
SQL for every resource. Every read and write below is scoped by the owning
user id; a row that belongs to someone else is reported exactly like a
missing one (None / false).
Money is kept as decimal TEXT and parsed back with Decimal::from_str_exact.
 */

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/*==========Row helpers=========== */

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let text: String = row.try_get(column)?;
    Decimal::from_str_exact(&text).map_err(|e| {
        sqlx::Error::Decode(format!("Invalid Decimal format for {}: {}", column, e).into())
    })
}

// expects the category columns aliased as in CATEGORY_COLUMNS
fn category_from_row(row: &SqliteRow) -> Result<Category, sqlx::Error> {
    let ctype: String = row.try_get("category_type")?;
    Ok(Category {
        id: row.try_get("category_id")?,
        user_id: row.try_get("category_user_id")?,
        name: row.try_get("category_name")?,
        r#type: CategoryType::from_str(&ctype).map_err(|e| sqlx::Error::Decode(e.into()))?,
        color: row.try_get("color")?,
        icon: row.try_get("icon")?,
        created_at: row.try_get("category_created_at")?,
    })
}

// LEFT JOIN: no category name means no category
fn optional_category_from_row(row: &SqliteRow) -> Result<Option<Category>, sqlx::Error> {
    let name: Option<String> = row.try_get("category_name")?;
    match name {
        Some(_) => category_from_row(row).map(Some),
        None => Ok(None),
    }
}

const CATEGORY_COLUMNS: &str = r#"
    c.category_id,
    c.user_id AS category_user_id,
    c.category_name,
    c.category_type,
    c.color,
    c.icon,
    c.category_created_at
"#;

/*==========User Queries=========== */

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("user_created_at")?,
    })
}

pub async fn create_user(
    pool: &Pool<Sqlite>,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, user_created_at)
        VALUES (?, ?, ?)
        RETURNING user_id, email, password_hash, user_created_at
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    user_from_row(&row)
}

pub async fn find_user_by_email(
    pool: &Pool<Sqlite>,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT user_id, email, password_hash, user_created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .map(|row| user_from_row(&row))
    .transpose()
}

// Returns false when no user has that email
pub async fn update_password_hash(
    pool: &Pool<Sqlite>,
    email: &str,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password_hash = ? WHERE email = ?")
        .bind(password_hash)
        .bind(email)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/*==========Category Queries=========== */

pub async fn create_category(
    pool: &Pool<Sqlite>,
    user_id: i64,
    new: &NewCategory,
) -> Result<Category, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO categories (user_id, category_name, category_type, color, icon, category_created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING
            category_id,
            user_id AS category_user_id,
            category_name,
            category_type,
            color,
            icon,
            category_created_at
        "#,
    )
    .bind(user_id)
    .bind(&new.name)
    .bind(new.r#type.as_str())
    .bind(new.color.as_deref())
    .bind(new.icon.as_deref())
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    category_from_row(&row)
}

pub async fn list_categories(
    pool: &Pool<Sqlite>,
    user_id: i64,
    filter: &CategoryFilter,
) -> Result<Vec<Category>, sqlx::Error> {
    let kind = filter.r#type.map(|t| t.as_str());

    sqlx::query(&format!(
        r#"
        SELECT {CATEGORY_COLUMNS}
        FROM categories c
        WHERE c.user_id = ?
          AND (? IS NULL OR c.category_type = ?)
        ORDER BY c.category_name ASC, c.category_id ASC
        "#
    ))
    .bind(user_id)
    .bind(kind)
    .bind(kind)
    .fetch_all(pool)
    .await?
    .iter()
    .map(category_from_row)
    .collect()
}

pub async fn find_category(
    pool: &Pool<Sqlite>,
    user_id: i64,
    category_id: i64,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query(&format!(
        r#"
        SELECT {CATEGORY_COLUMNS}
        FROM categories c
        WHERE c.category_id = ? AND c.user_id = ?
        "#
    ))
    .bind(category_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .map(|row| category_from_row(&row))
    .transpose()
}

/*==========Transaction Queries=========== */

const TRANSACTION_SELECT: &str = r#"
    SELECT
        t.transaction_id,
        t.user_id,
        t.category_id,
        t.amount,
        t.description,
        t.transacted_at,
        t.is_recurring,
        t.recurring_id,
        t.trans_create_at,
        c.user_id AS category_user_id,
        c.category_name,
        c.category_type,
        c.color,
        c.icon,
        c.category_created_at
    FROM transactions t
    LEFT JOIN categories c ON c.category_id = t.category_id
"#;

// Each optional filter is bound as (value, value) so NULL disables it
const TRANSACTION_WHERE: &str = r#"
    WHERE t.user_id = ?
      AND (? IS NULL OR t.category_id = ?)
      AND (? IS NULL OR t.transacted_at >= ?)
      AND (? IS NULL OR t.transacted_at <= ?)
      AND (? IS NULL
           OR (? = 'income' AND CAST(t.amount AS REAL) > 0)
           OR (? = 'expense' AND CAST(t.amount AS REAL) < 0))
      AND (? IS NULL OR instr(lower(t.description), lower(?)) > 0)
"#;

fn bind_transaction_filter<'q>(
    query: SqliteQuery<'q>,
    user_id: i64,
    filter: &'q TransactionFilter,
) -> SqliteQuery<'q> {
    let kind = filter.kind.map(|k| k.as_str());
    let search = filter.search.as_deref();

    query
        .bind(user_id)
        .bind(filter.category_id)
        .bind(filter.category_id)
        .bind(filter.start_date)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(filter.end_date)
        .bind(kind)
        .bind(kind)
        .bind(kind)
        .bind(search)
        .bind(search)
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, sqlx::Error> {
    Ok(Transaction {
        id: row.try_get("transaction_id")?,
        user_id: row.try_get("user_id")?,
        amount: decimal_column(row, "amount")?,
        description: row.try_get("description")?,
        date: row.try_get("transacted_at")?,
        category_id: row.try_get("category_id")?,
        category: optional_category_from_row(row)?,
        is_recurring: row.try_get("is_recurring")?,
        recurring_id: row.try_get("recurring_id")?,
        created_at: row.try_get("trans_create_at")?,
    })
}

// The category (if any) must already be checked against the user
pub async fn create_transaction(
    pool: &Pool<Sqlite>,
    user_id: i64,
    t: &NewTransaction,
) -> Result<Transaction, sqlx::Error> {
    let new_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO transactions (
            user_id, category_id, amount, description,
            transacted_at, is_recurring, recurring_id, trans_create_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING transaction_id
        "#,
    )
    .bind(user_id)
    .bind(t.category_id)
    .bind(t.amount.to_string())
    .bind(&t.description)
    .bind(t.date)
    .bind(t.is_recurring)
    .bind(t.recurring_id)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    get_transaction(pool, user_id, new_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn get_transaction(
    pool: &Pool<Sqlite>,
    user_id: i64,
    transaction_id: i64,
) -> Result<Option<Transaction>, sqlx::Error> {
    sqlx::query(&format!(
        "{TRANSACTION_SELECT} WHERE t.transaction_id = ? AND t.user_id = ?"
    ))
    .bind(transaction_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .map(|row| transaction_from_row(&row))
    .transpose()
}

// One page of the user's transactions, newest first
pub async fn list_transactions(
    pool: &Pool<Sqlite>,
    user_id: i64,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let sql = format!(
        r#"
        {TRANSACTION_SELECT}
        {TRANSACTION_WHERE}
        ORDER BY t.transacted_at DESC, t.transaction_id DESC
        LIMIT ? OFFSET ?
        "#
    );

    bind_transaction_filter(sqlx::query(&sql), user_id, filter)
        .bind(filter.limit)
        .bind(Pagination::offset(filter.page, filter.limit))
        .fetch_all(pool)
        .await?
        .iter()
        .map(transaction_from_row)
        .collect()
}

// Total rows matching the filter, ignoring page/limit
pub async fn count_transactions(
    pool: &Pool<Sqlite>,
    user_id: i64,
    filter: &TransactionFilter,
) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) AS total FROM transactions t {TRANSACTION_WHERE}");

    let row = bind_transaction_filter(sqlx::query(&sql), user_id, filter)
        .fetch_one(pool)
        .await?;

    row.try_get("total")
}

pub async fn delete_transaction(
    pool: &Pool<Sqlite>,
    user_id: i64,
    transaction_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE transaction_id = ? AND user_id = ?")
        .bind(transaction_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// Net signed amount per category for transactions dated inside [start, end]
pub async fn category_totals(
    pool: &Pool<Sqlite>,
    user_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<HashMap<i64, Decimal>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT category_id, amount
        FROM transactions
        WHERE user_id = ?
          AND category_id IS NOT NULL
          AND transacted_at >= ?
          AND transacted_at <= ?
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    let mut totals: HashMap<i64, Decimal> = HashMap::new();
    for row in &rows {
        let category_id: i64 = row.try_get("category_id")?;
        let total = totals.entry(category_id).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(decimal_column(row, "amount")?)
            .ok_or_else(|| sqlx::Error::Decode(AmountOverflow.into()))?;
    }
    Ok(totals)
}

/*==========Budget Queries=========== */

const BUDGET_ITEM_SELECT: &str = r#"
    SELECT
        i.item_id,
        i.budget_id,
        i.amount,
        c.category_id,
        c.user_id AS category_user_id,
        c.category_name,
        c.category_type,
        c.color,
        c.icon,
        c.category_created_at
    FROM budget_items i
    JOIN budgets b ON b.budget_id = i.budget_id
    JOIN categories c ON c.category_id = i.category_id
"#;

fn budget_item_from_row(row: &SqliteRow) -> Result<BudgetItem, sqlx::Error> {
    let category = category_from_row(row)?;
    Ok(BudgetItem {
        id: row.try_get("item_id")?,
        budget_id: row.try_get("budget_id")?,
        category_id: category.id,
        amount: decimal_column(row, "amount")?,
        category,
    })
}

fn budget_from_row(row: &SqliteRow) -> Result<Budget, sqlx::Error> {
    Ok(Budget {
        id: row.try_get("budget_id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("budget_name")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        created_at: row.try_get("budget_created_at")?,
        items: Vec::new(),
    })
}

/* Budget and items are written in one SQL transaction,
so a failing item insert leaves no half-created budget behind. */
pub async fn create_budget(
    pool: &Pool<Sqlite>,
    user_id: i64,
    b: &NewBudget,
) -> Result<Budget, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let budget_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO budgets (user_id, budget_name, start_date, end_date, budget_created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING budget_id
        "#,
    )
    .bind(user_id)
    .bind(&b.name)
    .bind(b.start_date)
    .bind(b.end_date)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    for item in &b.items {
        sqlx::query(
            r#"
            INSERT INTO budget_items (budget_id, category_id, amount)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(budget_id)
        .bind(item.category_id)
        .bind(item.amount.to_string())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    get_budget(pool, user_id, budget_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn get_budget(
    pool: &Pool<Sqlite>,
    user_id: i64,
    budget_id: i64,
) -> Result<Option<Budget>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT budget_id, user_id, budget_name, start_date, end_date, budget_created_at
        FROM budgets
        WHERE budget_id = ? AND user_id = ?
        "#,
    )
    .bind(budget_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut budget = budget_from_row(&row)?;
    budget.items = sqlx::query(&format!(
        "{BUDGET_ITEM_SELECT} WHERE i.budget_id = ? ORDER BY i.item_id ASC"
    ))
    .bind(budget_id)
    .fetch_all(pool)
    .await?
    .iter()
    .map(budget_item_from_row)
    .collect::<Result<Vec<BudgetItem>, sqlx::Error>>()?;

    Ok(Some(budget))
}

// Budgets with their items, latest start date first
pub async fn list_budgets(
    pool: &Pool<Sqlite>,
    user_id: i64,
    filter: &BudgetFilter,
) -> Result<Vec<Budget>, sqlx::Error> {
    let day = filter.active_on;

    let mut budgets = sqlx::query(
        r#"
        SELECT budget_id, user_id, budget_name, start_date, end_date, budget_created_at
        FROM budgets
        WHERE user_id = ?
          AND (? IS NULL OR (start_date <= ? AND end_date >= ?))
        ORDER BY start_date DESC, budget_id DESC
        "#,
    )
    .bind(user_id)
    .bind(day)
    .bind(day)
    .bind(day)
    .fetch_all(pool)
    .await?
    .iter()
    .map(budget_from_row)
    .collect::<Result<Vec<Budget>, sqlx::Error>>()?;

    let item_rows = sqlx::query(&format!(
        r#"
        {BUDGET_ITEM_SELECT}
        WHERE b.user_id = ?
          AND (? IS NULL OR (b.start_date <= ? AND b.end_date >= ?))
        ORDER BY i.item_id ASC
        "#
    ))
    .bind(user_id)
    .bind(day)
    .bind(day)
    .bind(day)
    .fetch_all(pool)
    .await?;

    let mut by_budget: HashMap<i64, Vec<BudgetItem>> = HashMap::new();
    for row in &item_rows {
        let item = budget_item_from_row(row)?;
        by_budget.entry(item.budget_id).or_default().push(item);
    }

    for budget in &mut budgets {
        budget.items = by_budget.remove(&budget.id).unwrap_or_default();
    }

    Ok(budgets)
}

// Items go with the budget (ON DELETE CASCADE)
pub async fn delete_budget(
    pool: &Pool<Sqlite>,
    user_id: i64,
    budget_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM budgets WHERE budget_id = ? AND user_id = ?")
        .bind(budget_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/*==========Saving Queries=========== */

const SAVINGS_GOAL_COLUMNS: &str = r#"
    goal_id, user_id, goal_name, target_amount, current_amount, deadline, goal_created_at
"#;

fn savings_goal_from_row(row: &SqliteRow) -> Result<SavingsGoal, sqlx::Error> {
    Ok(SavingsGoal {
        id: row.try_get("goal_id")?,
        user_id: row.try_get("user_id")?,
        name: row.try_get("goal_name")?,
        target_amount: decimal_column(row, "target_amount")?,
        current_amount: decimal_column(row, "current_amount")?,
        target_date: row.try_get("deadline")?,
        created_at: row.try_get("goal_created_at")?,
    })
}

pub async fn create_savings_goal(
    pool: &Pool<Sqlite>,
    user_id: i64,
    g: &NewSavingsGoal,
) -> Result<SavingsGoal, sqlx::Error> {
    let row = sqlx::query(&format!(
        r#"
        INSERT INTO savings_goals
            (user_id, goal_name, target_amount, current_amount, deadline, goal_created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {SAVINGS_GOAL_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&g.name)
    .bind(g.target_amount.to_string())
    .bind(g.current_amount.to_string())
    .bind(g.target_date)
    .bind(Utc::now())
    .fetch_one(pool)
    .await?;

    savings_goal_from_row(&row)
}

pub async fn list_savings_goals(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<SavingsGoal>, sqlx::Error> {
    sqlx::query(&format!(
        r#"
        SELECT {SAVINGS_GOAL_COLUMNS}
        FROM savings_goals
        WHERE user_id = ?
        ORDER BY goal_created_at DESC, goal_id DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?
    .iter()
    .map(savings_goal_from_row)
    .collect()
}

pub async fn get_savings_goal(
    pool: &Pool<Sqlite>,
    user_id: i64,
    goal_id: i64,
) -> Result<Option<SavingsGoal>, sqlx::Error> {
    sqlx::query(&format!(
        "SELECT {SAVINGS_GOAL_COLUMNS} FROM savings_goals WHERE goal_id = ? AND user_id = ?"
    ))
    .bind(goal_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .map(|row| savings_goal_from_row(&row))
    .transpose()
}

// COALESCE keeps every column the caller did not send
pub async fn update_savings_goal(
    pool: &Pool<Sqlite>,
    user_id: i64,
    goal_id: i64,
    changes: &SavingsGoalChanges,
) -> Result<Option<SavingsGoal>, sqlx::Error> {
    sqlx::query(&format!(
        r#"
        UPDATE savings_goals
        SET goal_name = COALESCE(?, goal_name),
            target_amount = COALESCE(?, target_amount),
            current_amount = COALESCE(?, current_amount),
            deadline = COALESCE(?, deadline)
        WHERE goal_id = ? AND user_id = ?
        RETURNING {SAVINGS_GOAL_COLUMNS}
        "#
    ))
    .bind(changes.name.as_deref())
    .bind(changes.target_amount.map(|d| d.to_string()))
    .bind(changes.current_amount.map(|d| d.to_string()))
    .bind(changes.target_date)
    .bind(goal_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .map(|row| savings_goal_from_row(&row))
    .transpose()
}

pub async fn delete_savings_goal(
    pool: &Pool<Sqlite>,
    user_id: i64,
    goal_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM savings_goals WHERE goal_id = ? AND user_id = ?")
        .bind(goal_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/*==========Report Queries=========== */

// (category, signed amount) for every transaction in the optional range
pub async fn report_rows(
    pool: &Pool<Sqlite>,
    user_id: i64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<(Option<Category>, Decimal)>, sqlx::Error> {
    sqlx::query(&format!(
        r#"
        SELECT t.amount, {CATEGORY_COLUMNS}
        FROM transactions t
        LEFT JOIN categories c ON c.category_id = t.category_id
        WHERE t.user_id = ?
          AND (? IS NULL OR t.transacted_at >= ?)
          AND (? IS NULL OR t.transacted_at <= ?)
        "#
    ))
    .bind(user_id)
    .bind(start)
    .bind(start)
    .bind(end)
    .bind(end)
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| Ok::<_, sqlx::Error>((optional_category_from_row(row)?, decimal_column(row, "amount")?)))
    .collect()
}
