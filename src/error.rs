//! Defines the app level error type and its conversion to JSON error responses.
//!
//! Every error leaves the server as `{"error": "<code>", "message": "<text>"}`.
//! Internal failures are logged and replaced with a generic message so store
//! level details never reach the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

/// The message sent to clients for any unexpected server-side failure.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "Ocurrió un error inesperado. Intenta de nuevo más tarde.";

/// The message sent to clients when a one-time code could not be emailed.
pub const EMAIL_FAILURE_MESSAGE: &str = "No pudimos enviar el código por correo. \
    El servicio de email puede no estar configurado; intenta más tarde o contacta al administrador.";

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request body was malformed, missing fields, or failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// A query string parameter was missing, malformed or out of range.
    #[error("{0}")]
    InvalidParameter(String),

    /// The request body is larger than the server accepts.
    #[error("el cuerpo de la solicitud es demasiado grande")]
    PayloadTooLarge,

    /// The category referenced by a transaction or budget does not exist or
    /// belongs to another user.
    #[error("la categoría no existe o no te pertenece")]
    InvalidCategory,

    /// An update request did not contain any fields.
    #[error("no se proporcionaron campos para actualizar")]
    NoFieldsToUpdate,

    /// A savings adjustment used an amount of zero or less.
    #[error("el monto debe ser mayor a 0")]
    NonPositiveAmount,

    /// A savings account was created with a negative balance.
    #[error("el balance inicial no puede ser negativo")]
    NegativeInitialBalance,

    /// A withdrawal asked for more than the account holds.
    #[error("fondos insuficientes en esta cuenta")]
    InsufficientFunds,

    /// The email or one-time code given for a password reset was not valid.
    ///
    /// Unknown emails and bad codes share this variant so that the response
    /// does not reveal which emails are registered.
    #[error("código OTP inválido o expirado. Solicita uno nuevo")]
    ResetFailed,

    /// A protected route was called without an `Authorization` header.
    #[error("token requerido")]
    MissingToken,

    /// The bearer token was malformed, had a bad signature, or used an
    /// unexpected signing algorithm.
    #[error("token inválido")]
    TokenInvalid,

    /// The bearer token was valid but has expired.
    #[error("token expirado, inicia sesión de nuevo")]
    TokenExpired,

    /// The email and password combination did not match a registered user.
    #[error("correo o contraseña incorrectos")]
    InvalidCredentials,

    /// The requested resource was not found, or is owned by another user.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("el recurso solicitado no existe")]
    NotFound,

    /// The email used to register is already in use.
    #[error("el email ya está registrado")]
    EmailTaken,

    /// A password reset was requested but no email provider is configured.
    #[error("el servicio de email no está configurado")]
    EmailServiceUnavailable,

    /// The email provider rejected or failed to deliver a message.
    #[error("could not send email: {0}")]
    EmailDelivery(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An access token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// A connection could not be checked out of the database pool.
    #[error("could not get a database connection: {0}")]
    DatabasePool(String),

    /// The CSV export could not be written.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl Error {
    /// The HTTP status code the error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_)
            | Error::InvalidParameter(_)
            | Error::InvalidCategory
            | Error::NoFieldsToUpdate
            | Error::NonPositiveAmount
            | Error::NegativeInitialBalance
            | Error::InsufficientFunds
            | Error::ResetFailed => StatusCode::BAD_REQUEST,
            Error::MissingToken
            | Error::TokenInvalid
            | Error::TokenExpired
            | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::EmailTaken => StatusCode::CONFLICT,
            Error::EmailServiceUnavailable
            | Error::EmailDelivery(_)
            | Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::DatabasePool(_)
            | Error::CsvError(_)
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The machine readable code placed in the `error` field of the response.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_)
            | Error::NoFieldsToUpdate
            | Error::NegativeInitialBalance
            | Error::PayloadTooLarge => "datos_invalidos",
            Error::InvalidParameter(_) => "parametro_invalido",
            Error::InvalidCategory => "categoria_invalida",
            Error::NonPositiveAmount | Error::InsufficientFunds => "error_ajustando",
            Error::ResetFailed => "reset_fallido",
            Error::MissingToken => "no_autorizado",
            Error::TokenInvalid => "token_invalido",
            Error::TokenExpired => "token_expirado",
            Error::InvalidCredentials => "credenciales_invalidas",
            Error::NotFound => "no_encontrado",
            Error::EmailTaken => "registro_fallido",
            Error::EmailServiceUnavailable | Error::EmailDelivery(_) => "error_envio",
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::DatabasePool(_)
            | Error::CsvError(_)
            | Error::SqlError(_) => "error_servidor",
        }
    }
}

/// The JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// A machine readable error code, e.g. "datos_invalidos".
    pub error: String,
    /// A human readable description of the error.
    pub message: String,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::EmailTaken
            }
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, _) if sql_error.extended_code == 787 => {
                Error::InvalidCategory
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<r2d2::Error> for Error {
    fn from(value: r2d2::Error) -> Self {
        Error::DatabasePool(value.to_string())
    }
}

impl From<ValidationErrors> for Error {
    fn from(value: ValidationErrors) -> Self {
        Error::InvalidInput(format!("Verifica los datos enviados: {value}"))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match self {
            Error::EmailServiceUnavailable | Error::EmailDelivery(_) => {
                tracing::error!("Could not send a one-time code: {}", self);
                EMAIL_FAILURE_MESSAGE.to_owned()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            ref error if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("An unexpected error occurred: {}", error);
                INTERNAL_ERROR_MESSAGE.to_owned()
            }
            ref error => error.to_string(),
        };

        let body = ErrorBody {
            error: self.code().to_owned(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
