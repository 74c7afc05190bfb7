//! Code for creating the user table and reading and updating users in the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
///
/// The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, lower-cased.
    pub email: String,
    /// The user's display name.
    pub name: String,
    /// The user's password hash.
    #[serde(skip_serializing)]
    pub password_hash: PasswordHash,
    /// Whether savings balances are counted in the user's overall total.
    pub include_savings_in_total: bool,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The data needed to register a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// The user's email address.
    pub email: String,
    /// The user's display name.
    pub name: String,
    /// The hash of the user's password.
    pub password_hash: PasswordHash,
}

/// Normalize an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                include_savings_in_total INTEGER NOT NULL DEFAULT 0,
                categories_seeded INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

const USER_COLUMNS: &str =
    "id, email, name, password_hash, include_savings_in_total, created_at, updated_at";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        include_savings_in_total: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns [Error::EmailTaken] if the email is already registered, or
/// [Error::SqlError] if an SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let now = OffsetDateTime::now_utc();

    connection
        .prepare(&format!(
            "INSERT INTO user (email, name, password_hash, created_at, updated_at) \
            VALUES (?1, ?2, ?3, ?4, ?4) RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            (
                normalize_email(&new_user.email),
                new_user.name.trim(),
                new_user.password_hash.as_ref(),
                now,
            ),
            map_user_row,
        )
        .map_err(Error::from)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`, compared case-insensitively.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that email.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE email = :email"))?
        .query_row(&[(":email", &normalize_email(email))], map_user_row)
        .map_err(|error| error.into())
}

/// Replace the password hash of the user with `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
        (
            password_hash.as_ref(),
            OffsetDateTime::now_utc(),
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Set whether savings are included in the user's overall total.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn set_include_savings_in_total(
    user_id: UserID,
    include_savings_in_total: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET include_savings_in_total = ?1, updated_at = ?2 WHERE id = ?3",
        (
            include_savings_in_total,
            OffsetDateTime::now_utc(),
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Atomically mark the user's default categories as seeded.
///
/// Returns `true` for exactly one caller per user, the one that should insert
/// the default categories. Call this inside the same SQL transaction as the
/// inserts so a failed seed can be retried.
///
/// # Errors
///
/// Returns [Error::SqlError] if an SQL related error occurred.
pub fn claim_category_seeding(user_id: UserID, connection: &Connection) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET categories_seeded = 1 WHERE id = ?1 AND categories_seeded = 0",
        (user_id.as_i64(),),
    )?;

    Ok(rows_affected == 1)
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash,
        user::{
            NewUser, UserID, claim_category_seeding, create_user, get_user_by_email,
            get_user_by_id, set_include_savings_in_total, update_password,
        },
    };

    use super::create_user_table;

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_owned(),
            name: "Ana".to_owned(),
            password_hash: PasswordHash::new_unchecked("hunter2"),
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user = create_user(new_user("ana@example.com"), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "ana@example.com");
        assert_eq!(inserted_user.name, "Ana");
        assert_eq!(
            inserted_user.password_hash,
            PasswordHash::new_unchecked("hunter2")
        );
        assert!(!inserted_user.include_savings_in_total);
    }

    #[test]
    fn insert_user_normalizes_email() {
        let db_connection = get_db_connection();

        let inserted_user =
            create_user(new_user("  Ana@Example.COM "), &db_connection).unwrap();

        assert_eq!(inserted_user.email, "ana@example.com");
    }

    #[test]
    fn insert_duplicate_email_fails() {
        let db_connection = get_db_connection();
        create_user(new_user("ana@example.com"), &db_connection).unwrap();

        let result = create_user(new_user("ANA@example.com"), &db_connection);

        assert_eq!(result, Err(Error::EmailTaken));
    }

    #[test]
    fn get_user_by_id_succeeds() {
        let db_connection = get_db_connection();
        let inserted_user = create_user(new_user("ana@example.com"), &db_connection).unwrap();

        let selected_user = get_user_by_id(inserted_user.id, &db_connection).unwrap();

        assert_eq!(inserted_user, selected_user);
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let result = get_user_by_id(UserID::new(42), &db_connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn get_user_by_email_ignores_case() {
        let db_connection = get_db_connection();
        let inserted_user = create_user(new_user("ana@example.com"), &db_connection).unwrap();

        let selected_user = get_user_by_email("ANA@EXAMPLE.com", &db_connection).unwrap();

        assert_eq!(inserted_user.id, selected_user.id);
    }

    #[test]
    fn update_password_replaces_hash() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("ana@example.com"), &db_connection).unwrap();

        update_password(
            user.id,
            &PasswordHash::new_unchecked("newhash"),
            &db_connection,
        )
        .unwrap();

        let got = get_user_by_id(user.id, &db_connection).unwrap();
        assert_eq!(got.password_hash, PasswordHash::new_unchecked("newhash"));
    }

    #[test]
    fn update_password_fails_for_missing_user() {
        let db_connection = get_db_connection();

        let result = update_password(
            UserID::new(7),
            &PasswordHash::new_unchecked("newhash"),
            &db_connection,
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn set_include_savings_in_total_persists() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("ana@example.com"), &db_connection).unwrap();

        set_include_savings_in_total(user.id, true, &db_connection).unwrap();

        let got = get_user_by_id(user.id, &db_connection).unwrap();
        assert!(got.include_savings_in_total);
    }

    #[test]
    fn category_seeding_is_claimed_once() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("ana@example.com"), &db_connection).unwrap();

        assert!(claim_category_seeding(user.id, &db_connection).unwrap());
        assert!(!claim_category_seeding(user.id, &db_connection).unwrap());
    }

    #[test]
    fn serialized_user_omits_password_hash() {
        let db_connection = get_db_connection();
        let user = create_user(new_user("ana@example.com"), &db_connection).unwrap();

        let json = serde_json::to_string(&user).unwrap();

        assert!(!json.contains("password"), "got {json}");
        assert!(!json.contains("hunter2"), "got {json}");
    }
}
