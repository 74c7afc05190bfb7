//! The SQLite connection pool and schema initialisation.

use std::{path::Path, time::Duration};

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    auth::create_password_reset_table,
    budget::create_budget_table,
    category::create_category_table,
    savings::create_savings_account_table,
    transaction::create_transaction_table,
    user::create_user_table,
};

/// A bounded pool of SQLite connections.
pub type DbPool = Pool<SqliteConnectionManager>;

/// A connection checked out of a [DbPool].
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Limits for the connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// The maximum number of open connections.
    pub max_size: u32,
    /// The number of idle connections to keep open.
    pub min_idle: u32,
    /// Connections older than this are closed and replaced.
    pub max_lifetime: Duration,
    /// How long to wait for a connection before failing.
    pub connection_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            min_idle: 2,
            max_lifetime: Duration::from_secs(60 * 60),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

fn configure_connection(connection: &mut Connection) -> Result<(), rusqlite::Error> {
    connection.busy_timeout(BUSY_TIMEOUT)?;
    connection.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Open a connection pool for the database file at `path` and create any missing tables.
///
/// # Errors
/// Returns an error if the initial connections cannot be opened or the schema cannot be created.
pub fn create_pool(path: &Path, config: &PoolConfig) -> Result<DbPool, Error> {
    let manager = SqliteConnectionManager::file(path).with_init(configure_connection);

    let pool = Pool::builder()
        .max_size(config.max_size)
        .min_idle(Some(config.min_idle))
        .max_lifetime(Some(config.max_lifetime))
        .connection_timeout(config.connection_timeout)
        .build(manager)?;

    initialize(&*pool.get()?)?;

    Ok(pool)
}

/// Create a pool over a single in-memory database with all tables created.
///
/// Each in-memory connection is its own database, so the pool holds exactly one connection
/// that never expires. Callers must not check out a second connection while holding the first.
///
/// # Errors
/// Returns an error if the connection cannot be opened or the schema cannot be created.
pub fn create_in_memory_pool() -> Result<DbPool, Error> {
    let manager = SqliteConnectionManager::memory().with_init(configure_connection);

    let pool = Pool::builder()
        .max_size(1)
        .min_idle(Some(1))
        .max_lifetime(None)
        .idle_timeout(None)
        .connection_timeout(Duration::from_secs(5))
        .build(manager)?;

    initialize(&*pool.get()?)?;

    Ok(pool)
}

/// Create the all of the database tables for the application.
///
/// # Errors
/// This function may return a [rusqlite::Error] if something went wrong creating the tables.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_savings_account_table(&transaction)?;
    create_password_reset_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
