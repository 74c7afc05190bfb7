//! Resets forgotten passwords with a one-time code sent by email.

use axum::{Json, extract::State};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    auth::otp::{get_valid_otp, issue_otp, mark_otp_used},
    extract::ValidJson,
    response::MessageResponse,
    user::{get_user_by_email, update_password},
};

/// The reply to every accepted forgot-password request, registered email or not.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "Si el correo está registrado, recibirás un código de verificación";

/// The reply to a successful password reset.
pub const RESET_PASSWORD_MESSAGE: &str =
    "Contraseña actualizada exitosamente. Ya puedes iniciar sesión";

/// The body of a forgot-password request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    /// The email of the account to reset.
    #[validate(email(message = "ingresa un correo electrónico válido"))]
    pub email: String,
}

fn validate_otp_format(otp: &str) -> Result<(), ValidationError> {
    if otp.len() == 6 && otp.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("otp").with_message("el código debe tener 6 dígitos".into()))
    }
}

/// The body of a reset-password request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    /// The email of the account to reset.
    #[validate(email(message = "ingresa un correo electrónico válido"))]
    pub email: String,
    /// The six digit code that was emailed to the user.
    #[validate(custom(function = "validate_otp_format"))]
    pub otp: String,
    /// The new password, at least six characters.
    pub new_password: String,
}

/// A route handler that emails a one-time code to the owner of an account.
///
/// The same message is returned whether or not the email is registered.
///
/// # Errors
/// Returns [Error::EmailServiceUnavailable] if the email is registered but no
/// email provider is configured, or [Error::EmailDelivery] if the code could
/// not be sent.
pub async fn forgot_password_endpoint(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, Error> {
    // The connection must go back to the pool before waiting on the email provider.
    let issued_code = {
        let connection = state.db_pool.get()?;

        let user = match get_user_by_email(&request.email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                tracing::info!("Password reset requested for an unregistered email, ignoring.");
                return Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)));
            }
            Err(error) => return Err(error),
        };

        let Some(sender) = state.otp_sender.clone() else {
            return Err(Error::EmailServiceUnavailable);
        };

        (sender, user.email, issue_otp(user.id, &connection)?)
    };

    let (sender, email, code) = issued_code;
    sender.send_otp(&email, &code).await?;

    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)))
}

/// A route handler that replaces a user's password given a valid one-time code.
///
/// The code is consumed and the password replaced in a single SQL transaction.
///
/// # Errors
/// Returns [Error::ResetFailed] if the email is unknown, or the code is wrong,
/// expired, superseded or already used.
pub async fn reset_password_endpoint(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, Error> {
    let new_password = ValidatedPassword::new(&request.new_password)?;
    let connection = state.db_pool.get()?;

    let user = get_user_by_email(&request.email, &connection).map_err(into_reset_failed)?;
    let otp = get_valid_otp(user.id, &request.otp, &connection).map_err(into_reset_failed)?;
    let password_hash = PasswordHash::new(new_password, state.password_cost)?;

    let transaction = connection.unchecked_transaction()?;
    mark_otp_used(otp.id, &transaction).map_err(into_reset_failed)?;
    update_password(user.id, &password_hash, &transaction)?;
    transaction.commit()?;

    tracing::info!("Reset password for user {}", user.id);

    Ok(Json(MessageResponse::new(RESET_PASSWORD_MESSAGE)))
}

fn into_reset_failed(error: Error) -> Error {
    match error {
        Error::NotFound => Error::ResetFailed,
        error => error,
    }
}
