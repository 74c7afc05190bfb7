//! Filtered and paged transaction queries.
//!
//! A [TransactionFilter] is a list of typed predicates. One builder turns the
//! list into a WHERE clause and its parameters so that the count, page and
//! export queries always agree on which rows match.

use rusqlite::{Connection, params_from_iter, types::Value};
use time::Date;

use crate::{
    Error,
    category::CategoryId,
    date_format::format_date,
    pagination::Page,
    transaction::core::{SELECT_TRANSACTION, Transaction, map_transaction_row},
    transaction_type::TransactionType,
    user::UserID,
};

/// A single condition a transaction must meet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransactionPredicate {
    /// The transaction has this type.
    Type(TransactionType),
    /// The transaction belongs to this category.
    Category(CategoryId),
    /// The transaction happened on or after this date.
    DateFrom(Date),
    /// The transaction happened on or before this date.
    DateTo(Date),
}

impl TransactionPredicate {
    fn sql(&self) -> &'static str {
        match self {
            TransactionPredicate::Type(_) => "t.type = ?",
            TransactionPredicate::Category(_) => "t.category_id = ?",
            TransactionPredicate::DateFrom(_) => "t.date >= ?",
            TransactionPredicate::DateTo(_) => "t.date <= ?",
        }
    }

    fn value(&self) -> Value {
        match self {
            TransactionPredicate::Type(transaction_type) => {
                Value::Text(transaction_type.as_str().to_owned())
            }
            TransactionPredicate::Category(category_id) => Value::Integer(*category_id),
            TransactionPredicate::DateFrom(date) | TransactionPredicate::DateTo(date) => {
                Value::Text(format_date(*date))
            }
        }
    }
}

/// A conjunction of [TransactionPredicate]s. An empty filter matches every
/// transaction of the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    predicates: Vec<TransactionPredicate>,
}

impl TransactionFilter {
    /// Create a filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate to the filter.
    pub fn with(mut self, predicate: TransactionPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add a predicate to the filter if it is `Some`.
    pub fn with_optional(self, predicate: Option<TransactionPredicate>) -> Self {
        match predicate {
            Some(predicate) => self.with(predicate),
            None => self,
        }
    }

    /// Build the WHERE clause, always scoped to `user_id`, and its parameters.
    fn where_clause(&self, user_id: UserID) -> (String, Vec<Value>) {
        let mut conditions = vec!["t.user_id = ?"];
        let mut params = vec![Value::Integer(user_id.as_i64())];

        for predicate in &self.predicates {
            conditions.push(predicate.sql());
            params.push(predicate.value());
        }

        (format!("WHERE {}", conditions.join(" AND ")), params)
    }
}

/// Count the transactions of `user_id` that match `filter`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn count_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, params) = filter.where_clause(user_id);

    connection
        .query_row(
            &format!("SELECT COUNT(t.id) FROM \"transaction\" t {where_clause}"),
            params_from_iter(params),
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count as u64)
        .map_err(|error| error.into())
}

/// Get one page of the transactions of `user_id` that match `filter`, newest first.
///
/// A page past the last one is empty.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_transactions_page(
    user_id: UserID,
    filter: &TransactionFilter,
    page: Page,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let Some(offset) = page.offset() else {
        return Ok(Vec::new());
    };

    let (where_clause, mut params) = filter.where_clause(user_id);
    params.push(Value::Integer(page.limit as i64));
    params.push(Value::Integer(offset));

    // Sort by date, then creation time and ID to keep the order stable between pages.
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} {where_clause} \
            ORDER BY t.date DESC, t.created_at DESC, t.id DESC LIMIT ? OFFSET ?"
        ))?
        .query_map(params_from_iter(params), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Get every transaction of `user_id` that matches `filter`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_all_transactions(
    user_id: UserID,
    filter: &TransactionFilter,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, params) = filter.where_clause(user_id);

    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} {where_clause} \
            ORDER BY t.date DESC, t.created_at DESC, t.id DESC"
        ))?
        .query_map(params_from_iter(params), map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}
