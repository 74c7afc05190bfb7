//! Expense Tracker is a JSON API for tracking personal income and expenses.
//!
//! Users register with an email and password and then manage their own
//! categories, transactions, monthly budgets and savings accounts. The API
//! also produces monthly and yearly reports and CSV exports.
//!
//! Every route under `/api` except health and authentication needs a bearer
//! token issued by the register or log in routes.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod budget;
mod category;
mod config;
mod database_id;
mod date_format;
mod db;
mod email;
mod endpoints;
mod error;
mod extract;
mod health;
mod logging;
mod pagination;
mod password;
mod period;
mod report;
mod response;
mod routing;
mod savings;
mod transaction;
mod transaction_type;
mod user;
mod user_settings;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use config::{Config, RunMode};
pub use db::{DbPool, PoolConfig, create_pool, initialize as initialize_db};
pub use email::{OtpSender, ResendSender};
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID, get_user_by_email, update_password};

/// How long in-flight requests get to finish once shutdown starts.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
        },
    }
}
