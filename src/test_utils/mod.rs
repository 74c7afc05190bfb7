//! Helpers shared by the unit and HTTP tests.

#![allow(missing_docs)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword, build_router,
    db::create_in_memory_pool,
    email::OtpSender,
    user::{NewUser, User, create_user},
};

/// The password every test user is registered with.
pub(crate) const TEST_PASSWORD: &str = "hunter22";

/// The lowest bcrypt cost, to keep tests fast.
pub(crate) const TEST_PASSWORD_COST: u32 = 4;

/// Insert a user with [TEST_PASSWORD] directly into the database.
pub(crate) fn insert_test_user(email: &str, connection: &Connection) -> User {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        TEST_PASSWORD_COST,
    )
    .expect("Could not hash password");

    create_user(
        NewUser {
            email: email.to_owned(),
            name: "Ana".to_owned(),
            password_hash,
        },
        connection,
    )
    .expect("Could not create test user")
}

/// App state over a fresh in-memory database.
pub(crate) fn test_state(otp_sender: Option<Arc<dyn OtpSender>>) -> AppState {
    let db_pool = create_in_memory_pool().expect("Could not create in-memory database");

    AppState::new(db_pool, "foobar", otp_sender, TEST_PASSWORD_COST)
        .expect("Could not create app state")
}

/// A test server for the full app router.
pub(crate) fn test_server_from_state(state: AppState) -> TestServer {
    let app = build_router(state, &[]);

    TestServer::try_new(app).expect("Could not create test server.")
}

/// A test server without email delivery.
pub(crate) fn get_test_server() -> (TestServer, AppState) {
    let state = test_state(None);

    (test_server_from_state(state.clone()), state)
}

/// A test server whose emails are captured by the returned [RecordingSender].
pub(crate) fn get_test_server_with_sender() -> (TestServer, AppState, Arc<RecordingSender>) {
    let sender = Arc::new(RecordingSender::default());
    let state = test_state(Some(sender.clone()));

    (test_server_from_state(state.clone()), state, sender)
}

/// Register a user with [TEST_PASSWORD] through the API and return their token.
pub(crate) async fn register_user(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({
            "email": email,
            "password": TEST_PASSWORD,
            "name": "Ana",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    response.json::<Value>()["token"]
        .as_str()
        .expect("Could not get token from response")
        .to_owned()
}

/// Create a category through the API and return its ID.
pub(crate) async fn create_test_category(
    server: &TestServer,
    token: &str,
    name: &str,
    category_type: &str,
) -> i64 {
    let response = server
        .post("/api/categories")
        .authorization_bearer(token)
        .json(&json!({
            "name": name,
            "color": "#22c55e",
            "icon": name.to_lowercase(),
            "type": category_type,
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    response.json::<Value>()["id"]
        .as_i64()
        .expect("Could not get category ID from response")
}

/// An [OtpSender] that keeps every sent code in memory.
#[derive(Debug, Default)]
pub(crate) struct RecordingSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingSender {
    /// The most recent code sent to `email`.
    pub(crate) fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .expect("Could not lock sent emails")
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    /// The number of emails sent.
    pub(crate) fn sent_count(&self) -> usize {
        self.sent.lock().expect("Could not lock sent emails").len()
    }
}

#[async_trait]
impl OtpSender for RecordingSender {
    async fn send_otp(&self, to_email: &str, code: &str) -> Result<(), Error> {
        self.sent
            .lock()
            .expect("Could not lock sent emails")
            .push((to_email.to_owned(), code.to_owned()));

        Ok(())
    }
}

/// An [OtpSender] that always fails.
#[derive(Debug, Default)]
pub(crate) struct FailingSender;

#[async_trait]
impl OtpSender for FailingSender {
    async fn send_otp(&self, _to_email: &str, _code: &str) -> Result<(), Error> {
        Err(Error::EmailDelivery("the email provider is down".to_owned()))
    }
}
