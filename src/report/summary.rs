//! Aggregates a user's transactions into monthly and yearly totals.
//!
//! All sums are computed by SQLite from the transaction table, so a report
//! always agrees with the ledger at the time it is read.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, category::CategoryId, transaction_type::TransactionType, user::UserID};

/// Matches the transactions of one user in one month of one year.
const IN_MONTH: &str = "t.user_id = ?1 \
    AND CAST(strftime('%m', t.date) AS INTEGER) = ?2 \
    AND CAST(strftime('%Y', t.date) AS INTEGER) = ?3";

/// The income and expense totals of one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// 1 to 12.
    pub month: u8,
    /// The year of the month.
    pub year: i32,
    /// The sum of income in the month.
    pub total_income: f64,
    /// The sum of expenses in the month.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// The totals of each category used in the month, largest first.
    pub by_category: Vec<CategorySummary>,
}

/// The total of one category, and one transaction type, in a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// The ID of the category.
    pub category_id: CategoryId,
    /// The name of the category.
    pub category_name: String,
    /// The colour of the category.
    pub category_color: String,
    /// Whether the total is income or expenses.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The sum of the category's transactions.
    pub total: f64,
}

/// The income and expense totals of a year, broken down by month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlySummary {
    /// The year.
    pub year: i32,
    /// The sum of income in the year.
    pub total_income: f64,
    /// The sum of expenses in the year.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
    /// One entry per month that has transactions, in calendar order.
    /// Months without transactions are left out.
    pub monthly: Vec<MonthlyTotals>,
}

/// The totals of one month within a [YearlySummary].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// 1 to 12.
    pub month: u8,
    /// The sum of income in the month.
    pub total_income: f64,
    /// The sum of expenses in the month.
    pub total_expense: f64,
    /// Income minus expenses.
    pub balance: f64,
}

fn map_category_summary_row(row: &Row) -> Result<CategorySummary, rusqlite::Error> {
    Ok(CategorySummary {
        category_id: row.get(0)?,
        category_name: row.get(1)?,
        category_color: row.get(2)?,
        transaction_type: row.get(3)?,
        total: row.get(4)?,
    })
}

fn map_monthly_totals_row(row: &Row) -> Result<MonthlyTotals, rusqlite::Error> {
    let total_income: f64 = row.get(1)?;
    let total_expense: f64 = row.get(2)?;

    Ok(MonthlyTotals {
        month: row.get(0)?,
        total_income,
        total_expense,
        balance: total_income - total_expense,
    })
}

/// Summarise the transactions of `user_id` in `month` of `year`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_monthly_summary(
    user_id: UserID,
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<MonthlySummary, Error> {
    let (total_income, total_expense): (f64, f64) = connection.query_row(
        &format!(
            "SELECT \
                COALESCE(SUM(CASE WHEN t.type = 'income' THEN t.amount ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN t.type = 'expense' THEN t.amount ELSE 0 END), 0) \
            FROM \"transaction\" t WHERE {IN_MONTH}"
        ),
        (user_id.as_i64(), month, year),
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let by_category = connection
        .prepare(&format!(
            "SELECT c.id, c.name, c.color, t.type, SUM(t.amount) AS total \
            FROM \"transaction\" t JOIN category c ON t.category_id = c.id \
            WHERE {IN_MONTH} \
            GROUP BY c.id, c.name, c.color, t.type \
            ORDER BY total DESC, c.name ASC"
        ))?
        .query_map((user_id.as_i64(), month, year), map_category_summary_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MonthlySummary {
        month,
        year,
        total_income,
        total_expense,
        balance: total_income - total_expense,
        by_category,
    })
}

/// Summarise the transactions of `user_id` in `year`, month by month.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_yearly_summary(
    user_id: UserID,
    year: i32,
    connection: &Connection,
) -> Result<YearlySummary, Error> {
    let monthly = connection
        .prepare(
            "SELECT CAST(strftime('%m', t.date) AS INTEGER) AS month, \
                COALESCE(SUM(CASE WHEN t.type = 'income' THEN t.amount ELSE 0 END), 0), \
                COALESCE(SUM(CASE WHEN t.type = 'expense' THEN t.amount ELSE 0 END), 0) \
            FROM \"transaction\" t \
            WHERE t.user_id = ?1 AND CAST(strftime('%Y', t.date) AS INTEGER) = ?2 \
            GROUP BY month \
            ORDER BY month ASC",
        )?
        .query_map((user_id.as_i64(), year), map_monthly_totals_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let total_income = monthly.iter().map(|totals| totals.total_income).sum::<f64>();
    let total_expense = monthly.iter().map(|totals| totals.total_expense).sum::<f64>();

    Ok(YearlySummary {
        year,
        total_income,
        total_expense,
        balance: total_income - total_expense,
        monthly,
    })
}
