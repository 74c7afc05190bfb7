//! Database operations for categories.
//!
//! Every query is scoped by the owning user so that one user can never read or
//! change another user's categories.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{Category, CategoryId, CreateCategoryRequest, UpdateCategoryRequest},
    user::UserID,
};

/// Create the category table.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            nickname TEXT,
            color TEXT NOT NULL,
            icon TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('income', 'expense')),
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id);",
    )?;

    Ok(())
}

const CATEGORY_COLUMNS: &str = "id, user_id, name, nickname, color, icon, type, created_at";

pub(super) fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        nickname: row.get(3)?,
        color: row.get(4)?,
        icon: row.get(5)?,
        category_type: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Create a category owned by `user_id` and return it with its generated ID.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn create_category(
    user_id: UserID,
    request: &CreateCategoryRequest,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO category (user_id, name, color, icon, type, created_at) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                request.name.trim(),
                request.color.as_str(),
                request.icon.trim(),
                request.category_type,
                OffsetDateTime::now_utc(),
            ),
            map_row,
        )
        .map_err(Error::from)
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((category_id, user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve all of a user's categories ordered by type and then name.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM category WHERE user_id = ?1 ORDER BY type ASC, name ASC"
        ))?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Count the categories owned by `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn count_categories(user_id: UserID, connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM category WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get::<_, i64>(0),
        )
        .map(|count| count as usize)
        .map_err(|error| error.into())
}

/// Apply `update` to a category owned by `user_id` and return the updated category.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn update_category(
    category_id: CategoryId,
    user_id: UserID,
    update: &UpdateCategoryRequest,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = update.name.as_deref().map(str::trim);
    let nickname = update.nickname.as_deref().map(str::trim);
    let color = update.color.as_deref().map(str::trim);
    let icon = update.icon.as_deref().map(str::trim);

    connection
        .prepare(&format!(
            "UPDATE category SET \
                name = COALESCE(NULLIF(?1, ''), name), \
                nickname = CASE WHEN ?2 THEN NULLIF(?3, '') ELSE nickname END, \
                color = COALESCE(NULLIF(?4, ''), color), \
                icon = COALESCE(NULLIF(?5, ''), icon) \
            WHERE id = ?6 AND user_id = ?7 \
            RETURNING {CATEGORY_COLUMNS}"
        ))?
        .query_row(
            (
                name,
                nickname.is_some(),
                nickname,
                color,
                icon,
                category_id,
                user_id.as_i64(),
            ),
            map_row,
        )
        .map_err(|error| error.into())
}

/// Delete a category owned by `user_id`, along with its transactions and budgets.
///
/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to another user.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        (category_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}
