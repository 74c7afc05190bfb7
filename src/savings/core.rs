//! Defines the savings account model and its database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::{Error, database_id::DatabaseId, user::UserID};

// ============================================================================
// MODELS
// ============================================================================

/// The database ID of a savings account.
pub type SavingsAccountId = DatabaseId;

/// Money the user keeps aside from their monthly income and expenses,
/// e.g. a bank account or cash at home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsAccount {
    /// The ID of the account.
    pub id: SavingsAccountId,
    /// The user that owns the account.
    pub user_id: UserID,
    /// The display name, e.g. "Bancolombia".
    pub name: String,
    /// The amount of money in the account.
    pub balance: f64,
    /// The colour used to display the account.
    pub color: String,
    /// The key of the icon shown next to the account.
    pub icon: String,
    /// Free-form notes.
    pub notes: String,
    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the account was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The body of a request to create a savings account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSavingsAccountRequest {
    /// The display name.
    #[validate(length(min = 1, message = "el nombre es requerido"))]
    pub name: String,
    /// The starting balance. Defaults to zero and must not be negative.
    #[serde(default)]
    pub balance: f64,
    /// The display colour.
    #[validate(length(min = 1, message = "el color es requerido"))]
    pub color: String,
    /// The icon key.
    #[validate(length(min = 1, message = "el ícono es requerido"))]
    pub icon: String,
    /// Free-form notes.
    #[serde(default)]
    pub notes: String,
}

/// The body of a request to update a savings account.
///
/// Missing fields, and empty names, colours or icons, keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSavingsAccountRequest {
    /// The new display name.
    pub name: Option<String>,
    /// The new balance.
    pub balance: Option<f64>,
    /// The new display colour.
    pub color: Option<String>,
    /// The new icon key.
    pub icon: Option<String>,
    /// The new notes. An empty string clears them.
    pub notes: Option<String>,
}

/// Whether money goes into or out of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentType {
    /// Add money to the account.
    Deposit,
    /// Take money out of the account.
    Withdraw,
}

/// The body of a request to deposit into or withdraw from an account.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct AdjustBalanceRequest {
    /// The amount to move. Must be greater than zero.
    pub amount: f64,
    /// Deposit or withdraw.
    #[serde(rename = "type")]
    pub adjustment_type: AdjustmentType,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the savings account table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_savings_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS savings_account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0,
            color TEXT NOT NULL,
            icon TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_savings_account_user ON savings_account(user_id);",
    )
}

const SAVINGS_ACCOUNT_COLUMNS: &str =
    "id, user_id, name, balance, color, icon, notes, created_at, updated_at";

fn map_savings_account_row(row: &Row) -> Result<SavingsAccount, rusqlite::Error> {
    Ok(SavingsAccount {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        balance: row.get(3)?,
        color: row.get(4)?,
        icon: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Create a savings account owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NegativeInitialBalance] if the starting balance is below zero,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_savings_account(
    user_id: UserID,
    request: &CreateSavingsAccountRequest,
    connection: &Connection,
) -> Result<SavingsAccount, Error> {
    if request.balance < 0.0 {
        return Err(Error::NegativeInitialBalance);
    }

    connection
        .prepare(&format!(
            "INSERT INTO savings_account (user_id, name, balance, color, icon, notes, created_at, updated_at) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7) RETURNING {SAVINGS_ACCOUNT_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                request.name.trim(),
                request.balance,
                request.color.as_str(),
                request.icon.trim(),
                request.notes.as_str(),
                OffsetDateTime::now_utc(),
            ),
            map_savings_account_row,
        )
        .map_err(Error::from)
}

/// Retrieve a savings account owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to another user.
pub fn get_savings_account(
    id: SavingsAccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<SavingsAccount, Error> {
    connection
        .prepare(&format!(
            "SELECT {SAVINGS_ACCOUNT_COLUMNS} FROM savings_account WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_savings_account_row)
        .map_err(|error| error.into())
}

/// Retrieve all of a user's savings accounts, oldest first.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_savings_accounts(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<SavingsAccount>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SAVINGS_ACCOUNT_COLUMNS} FROM savings_account WHERE user_id = ?1 \
            ORDER BY created_at ASC, id ASC"
        ))?
        .query_map([user_id.as_i64()], map_savings_account_row)?
        .map(|account_result| account_result.map_err(Error::from))
        .collect()
}

/// Merge `update` over a savings account owned by `user_id` and store the result.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the account does not exist or belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_savings_account(
    id: SavingsAccountId,
    user_id: UserID,
    update: &UpdateSavingsAccountRequest,
    connection: &Connection,
) -> Result<SavingsAccount, Error> {
    let existing = get_savings_account(id, user_id, connection)?;

    let keep_if_blank = |new: &Option<String>, old: String| match new.as_deref().map(str::trim) {
        Some(new) if !new.is_empty() => new.to_owned(),
        _ => old,
    };

    let name = keep_if_blank(&update.name, existing.name);
    let color = keep_if_blank(&update.color, existing.color);
    let icon = keep_if_blank(&update.icon, existing.icon);
    let balance = update.balance.unwrap_or(existing.balance);
    let notes = update.notes.clone().unwrap_or(existing.notes);

    connection
        .prepare(&format!(
            "UPDATE savings_account \
            SET name = ?1, balance = ?2, color = ?3, icon = ?4, notes = ?5, updated_at = ?6 \
            WHERE id = ?7 AND user_id = ?8 \
            RETURNING {SAVINGS_ACCOUNT_COLUMNS}"
        ))?
        .query_row(
            (
                name,
                balance,
                color,
                icon,
                notes,
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
            ),
            map_savings_account_row,
        )
        .map_err(Error::from)
}

/// Deposit into or withdraw from a savings account owned by `user_id`.
///
/// The balance check and the change happen in a single UPDATE, so concurrent
/// withdrawals can never take the balance below zero.
///
/// # Errors
/// This function will return a:
/// - [Error::NonPositiveAmount] if the amount is zero or less,
/// - [Error::NotFound] if the account does not exist or belongs to another user,
/// - [Error::InsufficientFunds] if a withdrawal is larger than the balance,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn adjust_balance(
    id: SavingsAccountId,
    user_id: UserID,
    request: &AdjustBalanceRequest,
    connection: &Connection,
) -> Result<SavingsAccount, Error> {
    if request.amount.is_nan() || request.amount <= 0.0 {
        return Err(Error::NonPositiveAmount);
    }

    let query = match request.adjustment_type {
        AdjustmentType::Deposit => {
            "UPDATE savings_account SET balance = balance + ?1, updated_at = ?2 \
            WHERE id = ?3 AND user_id = ?4"
        }
        AdjustmentType::Withdraw => {
            "UPDATE savings_account SET balance = balance - ?1, updated_at = ?2 \
            WHERE id = ?3 AND user_id = ?4 AND balance >= ?1"
        }
    };

    let rows_affected = connection.execute(
        query,
        (
            request.amount,
            OffsetDateTime::now_utc(),
            id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        // Either the account is missing or a withdrawal was refused.
        get_savings_account(id, user_id, connection)?;
        return Err(Error::InsufficientFunds);
    }

    get_savings_account(id, user_id, connection)
}

/// Delete a savings account owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to another user.
pub fn delete_savings_account(
    id: SavingsAccountId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM savings_account WHERE id = ?1 AND user_id = ?2",
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

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize, test_utils::insert_test_user, user::UserID};

    use super::{
        AdjustBalanceRequest, AdjustmentType, CreateSavingsAccountRequest, SavingsAccount,
        UpdateSavingsAccountRequest, adjust_balance, create_savings_account,
        delete_savings_account, get_savings_account, get_savings_accounts,
        update_savings_account,
    };

    fn get_test_connection() -> (Connection, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user_id = insert_test_user("ana@example.com", &conn).id;

        (conn, user_id)
    }

    fn create(conn: &Connection, user_id: UserID, name: &str, balance: f64) -> SavingsAccount {
        create_savings_account(
            user_id,
            &CreateSavingsAccountRequest {
                name: name.to_owned(),
                balance,
                color: "#22c55e".to_owned(),
                icon: "banco".to_owned(),
                notes: String::new(),
            },
            conn,
        )
        .unwrap()
    }

    fn adjust(amount: f64, adjustment_type: AdjustmentType) -> AdjustBalanceRequest {
        AdjustBalanceRequest {
            amount,
            adjustment_type,
        }
    }

    #[test]
    fn negative_initial_balance_is_refused() {
        let (conn, user_id) = get_test_connection();

        let result = create_savings_account(
            user_id,
            &CreateSavingsAccountRequest {
                name: "Efectivo".to_owned(),
                balance: -1.0,
                color: "#22c55e".to_owned(),
                icon: "efectivo".to_owned(),
                notes: String::new(),
            },
            &conn,
        );

        assert_eq!(result, Err(Error::NegativeInitialBalance));
    }

    #[test]
    fn deposit_then_withdraw_restores_balance() {
        let (conn, user_id) = get_test_connection();
        let account = create(&conn, user_id, "Lulo", 1000.0);

        let after_deposit = adjust_balance(
            account.id,
            user_id,
            &adjust(250.0, AdjustmentType::Deposit),
            &conn,
        )
        .unwrap();
        let after_withdraw = adjust_balance(
            account.id,
            user_id,
            &adjust(250.0, AdjustmentType::Withdraw),
            &conn,
        )
        .unwrap();

        assert_eq!(after_deposit.balance, 1250.0);
        assert_eq!(after_withdraw.balance, 1000.0);
    }

    #[test]
    fn overdraw_fails_and_keeps_balance() {
        let (conn, user_id) = get_test_connection();
        let account = create(&conn, user_id, "Lulo", 100.0);

        let result = adjust_balance(
            account.id,
            user_id,
            &adjust(100.01, AdjustmentType::Withdraw),
            &conn,
        );

        assert_eq!(result, Err(Error::InsufficientFunds));
        assert_eq!(
            get_savings_account(account.id, user_id, &conn).unwrap().balance,
            100.0
        );
    }

    #[test]
    fn withdrawing_everything_is_allowed() {
        let (conn, user_id) = get_test_connection();
        let account = create(&conn, user_id, "Lulo", 100.0);

        let got = adjust_balance(
            account.id,
            user_id,
            &adjust(100.0, AdjustmentType::Withdraw),
            &conn,
        )
        .unwrap();

        assert_eq!(got.balance, 0.0);
    }

    #[test]
    fn non_positive_amounts_are_refused() {
        let (conn, user_id) = get_test_connection();
        let account = create(&conn, user_id, "Lulo", 100.0);

        for amount in [0.0, -5.0] {
            let result = adjust_balance(
                account.id,
                user_id,
                &adjust(amount, AdjustmentType::Deposit),
                &conn,
            );

            assert_eq!(result, Err(Error::NonPositiveAmount));
        }
    }

    #[test]
    fn adjusting_other_users_account_is_not_found() {
        let (conn, user_id) = get_test_connection();
        let other_user = insert_test_user("beto@example.com", &conn).id;
        let account = create(&conn, user_id, "Lulo", 100.0);

        for adjustment_type in [AdjustmentType::Deposit, AdjustmentType::Withdraw] {
            let result = adjust_balance(
                account.id,
                other_user,
                &adjust(1.0, adjustment_type),
                &conn,
            );

            assert_eq!(result, Err(Error::NotFound));
        }
    }

    #[test]
    fn update_merges_given_fields() {
        let (conn, user_id) = get_test_connection();
        let account = create(&conn, user_id, "Lulo", 100.0);

        let got = update_savings_account(
            account.id,
            user_id,
            &UpdateSavingsAccountRequest {
                name: Some(String::new()),
                notes: Some("Fondo de emergencia".to_owned()),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got.name, "Lulo");
        assert_eq!(got.balance, 100.0);
        assert_eq!(got.notes, "Fondo de emergencia");
    }

    #[test]
    fn list_is_oldest_first_and_owner_scoped() {
        let (conn, user_id) = get_test_connection();
        let other_user = insert_test_user("beto@example.com", &conn).id;
        create(&conn, user_id, "Lulo", 1.0);
        create(&conn, user_id, "Efectivo", 2.0);
        create(&conn, other_user, "Nequi", 3.0);

        let got = get_savings_accounts(user_id, &conn).unwrap();

        let names: Vec<&str> = got.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Lulo", "Efectivo"]);
    }

    #[test]
    fn delete_is_owner_scoped() {
        let (conn, user_id) = get_test_connection();
        let other_user = insert_test_user("beto@example.com", &conn).id;
        let account = create(&conn, user_id, "Lulo", 1.0);

        assert_eq!(
            delete_savings_account(account.id, other_user, &conn),
            Err(Error::NotFound)
        );
        assert_eq!(delete_savings_account(account.id, user_id, &conn), Ok(()));
    }
}
