//! Logs users in with their email and password.

use axum::{Json, extract::State};
use serde::Deserialize;
use validator::Validate;

use crate::{
    AppState, Error,
    auth::{register::AuthResponse, token::encode_token},
    extract::ValidJson,
    user::get_user_by_email,
};

/// The body of a log-in request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LogInRequest {
    /// Email entered during log-in.
    #[validate(email(message = "ingresa un correo electrónico válido"))]
    pub email: String,
    /// Password entered during log-in.
    #[validate(length(min = 1, message = "la contraseña es requerida"))]
    pub password: String,
}

/// A route handler for logging in.
///
/// An unknown email and a wrong password are both reported as
/// [Error::InvalidCredentials]. The password is checked against a dummy hash
/// when the email is unknown so both cases take about as long.
pub async fn log_in_endpoint(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<LogInRequest>,
) -> Result<Json<AuthResponse>, Error> {
    let connection = state.db_pool.get()?;

    let user = match get_user_by_email(&request.email, &connection) {
        Ok(user) => Some(user),
        Err(Error::NotFound) => None,
        Err(error) => return Err(error),
    };

    let password_hash = user
        .as_ref()
        .map_or(&state.dummy_password_hash, |user| &user.password_hash);
    let is_password_correct = password_hash.verify(&request.password).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        Error::HashingError(error.to_string())
    })?;

    match user {
        Some(user) if is_password_correct => {
            let token = encode_token(user.id, &state.jwt_keys)?;

            Ok(Json(AuthResponse { token, user }))
        }
        _ => Err(Error::InvalidCredentials),
    }
}
