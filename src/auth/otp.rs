//! One-time codes that authorise a password reset.
//!
//! A user has at most one live code at a time: issuing a new code first marks
//! every earlier unused code as used.

use rand::{Rng, rngs::OsRng};
use rusqlite::{Connection, Row, types::Type};
use time::{Duration, OffsetDateTime};

use crate::{Error, database_id::DatabaseId, user::UserID};

/// How long a code stays valid after it is issued.
pub const OTP_LIFETIME_MINUTES: i64 = 10;

/// A stored one-time code.
#[derive(Debug, Clone, PartialEq)]
pub struct PasswordReset {
    /// The ID of the record.
    pub id: DatabaseId,
    /// The user the code was issued to.
    pub user_id: UserID,
    /// The six digit code.
    pub otp_code: String,
    /// When the code stops being accepted.
    pub expires_at: OffsetDateTime,
    /// Whether the code has been consumed or superseded.
    pub used: bool,
}

/// Create the password reset table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_password_reset_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS password_reset (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            otp_code TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            used INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_password_reset_user ON password_reset(user_id, otp_code);",
    )
}

/// Generate a uniformly random six digit code from the operating system's
/// secure random source.
pub fn generate_otp() -> String {
    let code: u32 = OsRng.gen_range(0..1_000_000);

    format!("{code:06}")
}

fn map_row(row: &Row) -> Result<PasswordReset, rusqlite::Error> {
    let expires_at: i64 = row.get(3)?;
    let expires_at = OffsetDateTime::from_unix_timestamp(expires_at)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(error)))?;

    Ok(PasswordReset {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        otp_code: row.get(2)?,
        expires_at,
        used: row.get(4)?,
    })
}

/// Mark every unused code of `user_id` as used.
///
/// Returns the number of codes that were invalidated.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn invalidate_otps(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE password_reset SET used = 1 WHERE user_id = ?1 AND used = 0",
            [user_id.as_i64()],
        )
        .map_err(Error::from)
}

/// Store `otp_code` for `user_id`, valid until `expires_at`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn create_otp(
    user_id: UserID,
    otp_code: &str,
    expires_at: OffsetDateTime,
    connection: &Connection,
) -> Result<PasswordReset, Error> {
    connection
        .prepare(
            "INSERT INTO password_reset (user_id, otp_code, expires_at, created_at) \
            VALUES (?1, ?2, ?3, ?4) \
            RETURNING id, user_id, otp_code, expires_at, used",
        )?
        .query_row(
            (
                user_id.as_i64(),
                otp_code,
                expires_at.unix_timestamp(),
                OffsetDateTime::now_utc(),
            ),
            map_row,
        )
        .map_err(Error::from)
}

/// Invalidate the user's earlier codes and issue a fresh one.
///
/// Returns the new code.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn issue_otp(user_id: UserID, connection: &Connection) -> Result<String, Error> {
    let transaction = connection.unchecked_transaction()?;

    invalidate_otps(user_id, &transaction)?;

    let otp_code = generate_otp();
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(OTP_LIFETIME_MINUTES);
    create_otp(user_id, &otp_code, expires_at, &transaction)?;

    transaction.commit()?;

    Ok(otp_code)
}

/// Find the newest unused, unexpired record matching `user_id` and `otp_code`.
///
/// # Errors
/// Returns [Error::NotFound] if no such record exists.
pub fn get_valid_otp(
    user_id: UserID,
    otp_code: &str,
    connection: &Connection,
) -> Result<PasswordReset, Error> {
    connection
        .prepare(
            "SELECT id, user_id, otp_code, expires_at, used FROM password_reset \
            WHERE user_id = ?1 AND otp_code = ?2 AND used = 0 AND expires_at > ?3 \
            ORDER BY id DESC LIMIT 1",
        )?
        .query_row(
            (
                user_id.as_i64(),
                otp_code,
                OffsetDateTime::now_utc().unix_timestamp(),
            ),
            map_row,
        )
        .map_err(Error::from)
}

/// Consume the record with `id`.
///
/// Only an unused record can be consumed, so two concurrent resets with the
/// same code cannot both succeed.
///
/// # Errors
/// Returns [Error::NotFound] if the record does not exist or was already used.
pub fn mark_otp_used(id: DatabaseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE password_reset SET used = 1 WHERE id = ?1 AND used = 0",
        [id],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
