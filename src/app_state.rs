//! Implements a struct that holds the state of the REST server.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    Error, PasswordHash, ValidatedPassword,
    auth::JwtKeys,
    db::DbPool,
    email::OtpSender,
    pagination::PaginationConfig,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The pool of database connections.
    pub db_pool: DbPool,

    /// The keys used to sign and verify access tokens.
    pub jwt_keys: JwtKeys,

    /// Delivers password reset codes. `None` disables password resets.
    pub otp_sender: Option<Arc<dyn OtpSender>>,

    /// The bcrypt cost used when hashing new passwords.
    pub password_cost: u32,

    /// A hash that log-in checks against when the email is unknown, so that
    /// unknown emails take as long to reject as wrong passwords.
    pub dummy_password_hash: PasswordHash,

    /// The config that controls how to page transaction lists.
    pub pagination_config: PaginationConfig,
}

impl AppState {
    /// Create a new [AppState].
    ///
    /// `password_cost` should be [PasswordHash::DEFAULT_COST] outside of tests.
    ///
    /// # Errors
    /// Returns an error if the dummy password hash cannot be created.
    pub fn new(
        db_pool: DbPool,
        jwt_secret: &str,
        otp_sender: Option<Arc<dyn OtpSender>>,
        password_cost: u32,
    ) -> Result<Self, Error> {
        let dummy_password_hash = PasswordHash::new(
            ValidatedPassword::new_unchecked("not-a-real-password"),
            password_cost,
        )?;

        Ok(Self {
            db_pool,
            jwt_keys: JwtKeys::new(jwt_secret),
            otp_sender,
            password_cost,
            dummy_password_hash,
            pagination_config: PaginationConfig::default(),
        })
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db_pool.clone()
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_keys.clone()
    }
}

impl FromRef<AppState> for PaginationConfig {
    fn from_ref(state: &AppState) -> Self {
        state.pagination_config.clone()
    }
}
