//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use validator::Validate;

use crate::{
    Error,
    category::{CategoryId, get_category},
    database_id::DatabaseId,
    transaction_type::TransactionType,
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// The database ID of a transaction.
pub type TransactionId = DatabaseId;

/// The currency used when a request does not name one.
pub const DEFAULT_CURRENCY: &str = "COP";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_owned()
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Transactions are returned together with the display fields of their category
/// so clients do not need a second request to render them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// The name of the category.
    pub category_name: String,
    /// The nickname of the category, if any.
    pub category_nickname: Option<String>,
    /// The colour of the category.
    pub category_color: String,
    /// The icon key of the category.
    pub category_icon: String,
    /// The amount of money spent or earned. Always positive.
    pub amount: f64,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    #[serde(with = "crate::date_format")]
    pub date: Date,
    /// A three letter currency code, e.g. "COP".
    pub currency: String,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The body of a request to create a transaction.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    /// A category owned by the caller.
    pub category_id: CategoryId,
    /// The amount, greater than zero.
    #[validate(range(exclusive_min = 0.0, message = "el monto debe ser mayor a 0"))]
    pub amount: f64,
    /// Income or expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// At most 255 characters.
    #[serde(default)]
    #[validate(length(max = 255, message = "la descripción debe tener como máximo 255 caracteres"))]
    pub description: String,
    /// A "YYYY-MM-DD" date.
    #[serde(with = "crate::date_format")]
    pub date: Date,
    /// A three letter currency code. Defaults to [DEFAULT_CURRENCY].
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "la moneda debe tener 3 letras"))]
    pub currency: String,
}

/// The body of a request to update a transaction.
///
/// Any subset of the fields may be given, but at least one is required.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTransactionRequest {
    /// A category owned by the caller.
    pub category_id: Option<CategoryId>,
    /// The amount, greater than zero.
    #[validate(range(exclusive_min = 0.0, message = "el monto debe ser mayor a 0"))]
    pub amount: Option<f64>,
    /// Income or expense.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// At most 255 characters.
    #[validate(length(max = 255, message = "la descripción debe tener como máximo 255 caracteres"))]
    pub description: Option<String>,
    /// A "YYYY-MM-DD" date.
    #[serde(default, with = "crate::date_format::option")]
    pub date: Option<Date>,
    /// A three letter currency code.
    #[validate(length(equal = 3, message = "la moneda debe tener 3 letras"))]
    pub currency: Option<String>,
}

impl UpdateTransactionRequest {
    fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.amount.is_none()
            && self.transaction_type.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.currency.is_none()
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            amount REAL NOT NULL CHECK (amount > 0),
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            description TEXT NOT NULL DEFAULT '',
            date TEXT NOT NULL,
            currency TEXT NOT NULL DEFAULT 'COP',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
    )
}

/// The columns read by [map_transaction_row], joined with the owning category.
pub(super) const SELECT_TRANSACTION: &str = "SELECT t.id, t.user_id, t.category_id, \
    c.name, c.nickname, c.color, c.icon, \
    t.amount, t.type, t.description, t.date, t.currency, t.created_at, t.updated_at \
    FROM \"transaction\" t JOIN category c ON t.category_id = c.id";

/// Map a row selected with [SELECT_TRANSACTION] to a Transaction.
pub(super) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        category_id: row.get(2)?,
        category_name: row.get(3)?,
        category_nickname: row.get(4)?,
        category_color: row.get(5)?,
        category_icon: row.get(6)?,
        amount: row.get(7)?,
        transaction_type: row.get(8)?,
        description: row.get(9)?,
        date: row.get(10)?,
        currency: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

/// Create a transaction owned by `user_id`.
///
/// The category is checked for ownership in the same statement as the insert.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category does not exist or belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    request: &CreateTransactionRequest,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let id: TransactionId = connection
        .prepare(
            "INSERT INTO \"transaction\" \
                (user_id, category_id, amount, type, description, date, currency, created_at, updated_at) \
            SELECT ?1, id, ?3, ?4, ?5, ?6, ?7, ?8, ?8 FROM category WHERE id = ?2 AND user_id = ?1 \
            RETURNING id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                request.category_id,
                request.amount,
                request.transaction_type,
                request.description.trim(),
                request.date,
                request.currency.to_uppercase(),
                OffsetDateTime::now_utc(),
            ),
            |row| row.get(0),
        )
        .map_err(|error| match Error::from(error) {
            Error::NotFound => Error::InvalidCategory,
            error => error,
        })?;

    get_transaction(id, user_id, connection)
}

/// Retrieve a transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE t.id = ?1 AND t.user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .map_err(|error| error.into())
}

/// Apply `update` to a transaction owned by `user_id` and return the result.
///
/// # Errors
/// This function will return a:
/// - [Error::NoFieldsToUpdate] if `update` has no fields,
/// - [Error::InvalidCategory] if the new category does not belong to `user_id`,
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    update: &UpdateTransactionRequest,
    connection: &Connection,
) -> Result<Transaction, Error> {
    if update.is_empty() {
        return Err(Error::NoFieldsToUpdate);
    }

    if let Some(category_id) = update.category_id {
        get_category(category_id, user_id, connection).map_err(|error| match error {
            Error::NotFound => Error::InvalidCategory,
            error => error,
        })?;
    }

    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET \
            category_id = COALESCE(?1, category_id), \
            amount = COALESCE(?2, amount), \
            type = COALESCE(?3, type), \
            description = COALESCE(?4, description), \
            date = COALESCE(?5, date), \
            currency = COALESCE(?6, currency), \
            updated_at = ?7 \
        WHERE id = ?8 AND user_id = ?9",
        (
            update.category_id,
            update.amount,
            update.transaction_type,
            update.description.as_deref().map(str::trim),
            update.date,
            update.currency.as_deref().map(str::to_uppercase),
            OffsetDateTime::now_utc(),
            id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_transaction(id, user_id, connection)
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
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
