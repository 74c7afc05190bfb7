//! Defines the budget model and its database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::{Error, category::CategoryId, database_id::DatabaseId, user::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// The database ID of a budget.
pub type BudgetId = DatabaseId;

/// A spending limit for one category in one month.
///
/// `spent` is not stored. It is summed from the user's expense transactions
/// every time the budget is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user that owns the budget.
    pub user_id: UserID,
    /// The category the limit applies to.
    pub category_id: CategoryId,
    /// The name of the category.
    pub category_name: String,
    /// The colour of the category.
    pub category_color: String,
    /// The icon key of the category.
    pub category_icon: String,
    /// The most the user wants to spend in the month.
    pub amount_limit: f64,
    /// The sum of the category's expenses in the month.
    pub spent: f64,
    /// 1 to 12.
    pub month: u8,
    /// The year of the month.
    pub year: i32,
    /// When the budget was first set.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the limit was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The body of a request to set the budget of a category for a month.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetBudgetRequest {
    /// A category owned by the caller.
    pub category_id: CategoryId,
    /// The limit, greater than zero.
    #[validate(range(exclusive_min = 0.0, message = "el límite debe ser mayor a 0"))]
    pub amount_limit: f64,
    /// 1 to 12.
    #[validate(range(min = 1, max = 12, message = "el mes debe estar entre 1 y 12"))]
    pub month: u8,
    /// 2020 to 2100.
    #[validate(range(min = 2020, max = 2100, message = "el año debe estar entre 2020 y 2100"))]
    pub year: i32,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the budget table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount_limit REAL NOT NULL CHECK (amount_limit > 0),
            month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
            year INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(user_id, category_id, month, year),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        );",
    )
}

/// Selects budgets joined with their category. The spent amount is the sum
/// of the category's expenses in the budget's month.
const SELECT_BUDGET: &str = "SELECT b.id, b.user_id, b.category_id, c.name, c.color, c.icon, \
    b.amount_limit, \
    COALESCE(( \
        SELECT SUM(t.amount) FROM \"transaction\" t \
        WHERE t.user_id = b.user_id \
            AND t.category_id = b.category_id \
            AND t.type = 'expense' \
            AND CAST(strftime('%m', t.date) AS INTEGER) = b.month \
            AND CAST(strftime('%Y', t.date) AS INTEGER) = b.year \
    ), 0), \
    b.month, b.year, b.created_at, b.updated_at \
    FROM budget b JOIN category c ON b.category_id = c.id";

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        category_color: row.get(4)?,
        category_icon: row.get(5)?,
        amount_limit: row.get(6)?,
        spent: row.get(7)?,
        month: row.get(8)?,
        year: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Set the limit of the budget for a category and month, creating it if needed.
///
/// There is at most one budget per user, category and month. Setting it again
/// replaces the limit and keeps the rest of the row.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category does not exist or belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_budget(
    user_id: UserID,
    request: &SetBudgetRequest,
    connection: &Connection,
) -> Result<Budget, Error> {
    // The WHERE clause also keeps SQLite from reading ON CONFLICT as a join constraint.
    let id: BudgetId = connection
        .prepare(
            "INSERT INTO budget (user_id, category_id, amount_limit, month, year, created_at, updated_at) \
            SELECT ?1, id, ?3, ?4, ?5, ?6, ?6 FROM category WHERE id = ?2 AND user_id = ?1 \
            ON CONFLICT(user_id, category_id, month, year) \
            DO UPDATE SET amount_limit = excluded.amount_limit, updated_at = excluded.updated_at \
            RETURNING id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                request.category_id,
                request.amount_limit,
                request.month,
                request.year,
                OffsetDateTime::now_utc(),
            ),
            |row| row.get(0),
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::InvalidCategory,
            error => error,
        })?;

    get_budget(id, user_id, connection)
}

/// Retrieve a budget owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the budget does not exist or belongs to another user.
pub fn get_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<Budget, Error> {
    connection
        .prepare(&format!("{SELECT_BUDGET} WHERE b.id = ?1 AND b.user_id = ?2"))?
        .query_row((id, user_id.as_i64()), map_budget_row)
        .map_err(|error| error.into())
}

/// Retrieve the budgets of `user_id` for a month, ordered by category name.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_budgets_for_month(
    user_id: UserID,
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(&format!(
            "{SELECT_BUDGET} WHERE b.user_id = ?1 AND b.month = ?2 AND b.year = ?3 \
            ORDER BY c.name ASC"
        ))?
        .query_map((user_id.as_i64(), month, year), map_budget_row)?
        .map(|budget_result| budget_result.map_err(Error::from))
        .collect()
}

/// Delete a budget owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the budget does not exist or belongs to another user.
pub fn delete_budget(id: BudgetId, user_id: UserID, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
