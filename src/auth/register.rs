//! Registers new users.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    auth::token::encode_token,
    category::seed_default_categories,
    extract::ValidJson,
    user::{NewUser, User, create_user, get_user_by_email},
};

/// The body of a registration request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    /// The email to log in with.
    #[validate(email(message = "ingresa un correo electrónico válido"))]
    pub email: String,
    /// The password to log in with, at least six characters.
    pub password: String,
    /// The user's display name, at least two characters.
    #[validate(length(min = 2, message = "el nombre debe tener al menos 2 caracteres"))]
    pub name: String,
}

/// The response to a successful registration or log-in.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    /// A bearer token for the user.
    pub token: String,
    /// The user the token was issued to.
    pub user: User,
}

/// A route handler for registering a new user.
///
/// The new user is given the default category catalog and is logged in
/// straight away. Failing to create the default categories is logged and does
/// not fail the registration.
pub async fn register_endpoint(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), Error> {
    let password = ValidatedPassword::new(&request.password)?;
    let connection = state.db_pool.get()?;

    match get_user_by_email(&request.email, &connection) {
        Ok(_) => return Err(Error::EmailTaken),
        Err(Error::NotFound) => {}
        Err(error) => return Err(error),
    }

    let password_hash = PasswordHash::new(password, state.password_cost)?;
    let user = create_user(
        NewUser {
            email: request.email,
            name: request.name,
            password_hash,
        },
        &connection,
    )?;

    if let Err(error) = seed_default_categories(user.id, &connection) {
        tracing::error!("Could not create default categories for user {}: {error}", user.id);
    }

    let token = encode_token(user.id, &state.jwt_keys)?;
    tracing::info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[cfg(test)]
mod register_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        auth::token::decode_token, category::DEFAULT_CATEGORIES, error::ErrorBody,
        test_utils::get_test_server, user::UserID,
    };

    #[tokio::test]
    async fn register_returns_token_and_user() {
        let (server, state) = get_test_server();

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "email": "Ana@Example.com",
                "password": "hunter22",
                "name": "Ana",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<Value>();
        let user_id = UserID::new(body["user"]["id"].as_i64().unwrap());
        assert_eq!(body["user"]["email"], "ana@example.com");
        assert_eq!(body["user"]["name"], "Ana");
        assert!(body["user"].get("password_hash").is_none());
        assert_eq!(
            decode_token(body["token"].as_str().unwrap(), &state.jwt_keys),
            Ok(user_id)
        );
    }

    #[tokio::test]
    async fn register_seeds_default_categories() {
        let (server, _) = get_test_server();
        let token = crate::test_utils::register_user(&server, "ana@example.com").await;

        let response = server.get("/api/categories").authorization_bearer(token).await;

        response.assert_status_ok();
        let categories = response.json::<Value>()["categories"]
            .as_array()
            .unwrap()
            .len();
        assert_eq!(categories, DEFAULT_CATEGORIES.len());
    }

    #[tokio::test]
    async fn register_with_taken_email_fails() {
        let (server, _) = get_test_server();
        crate::test_utils::register_user(&server, "ana@example.com").await;

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "email": "ana@example.com",
                "password": "hunter22",
                "name": "Otra Ana",
            }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<ErrorBody>().error, "registro_fallido");
    }

    #[tokio::test]
    async fn register_with_invalid_fields_fails() {
        let (server, _) = get_test_server();

        for body in [
            json!({ "email": "not-an-email", "password": "hunter22", "name": "Ana" }),
            json!({ "email": "ana@example.com", "password": "short", "name": "Ana" }),
            json!({ "email": "ana@example.com", "password": "hunter22", "name": "A" }),
            json!({ "email": "ana@example.com", "password": "hunter22" }),
        ] {
            let response = server.post("/api/auth/register").json(&body).await;

            response.assert_status_bad_request();
            assert_eq!(response.json::<ErrorBody>().error, "datos_invalidos");
        }
    }
}
