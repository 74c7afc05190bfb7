//! Signs and verifies the JSON Web Tokens used as bearer tokens.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserID};

/// How long an access token stays valid after it is issued.
pub const TOKEN_DURATION: Duration = Duration::hours(72);

/// The contents of a JSON Web Token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the user the token was issued to.
    pub sub: String,
    /// The time the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// The expiry time of the token, in seconds since the Unix epoch.
    pub exp: i64,
}

/// The keys used to sign and verify tokens, derived from one shared secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtKeys {
    /// Derive the HMAC keys from `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issue a token for `user_id` that expires [TOKEN_DURATION] from now.
///
/// # Errors
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(user_id: UserID, keys: &JwtKeys) -> Result<String, Error> {
    encode_token_at(user_id, OffsetDateTime::now_utc(), keys)
}

fn encode_token_at(
    user_id: UserID,
    issued_at: OffsetDateTime,
    keys: &JwtKeys,
) -> Result<String, Error> {
    let claims = Claims {
        sub: user_id.to_string(),
        iat: issued_at.unix_timestamp(),
        exp: (issued_at + TOKEN_DURATION).unix_timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify `token` and return the ID of the user it was issued to.
///
/// Only HS256 tokens are accepted, and expiry is checked without leeway.
///
/// # Errors
/// Returns [Error::TokenExpired] if the token has expired, otherwise
/// [Error::TokenInvalid] for any malformed, tampered or mis-signed token.
pub fn decode_token(token: &str, keys: &JwtKeys) -> Result<UserID, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data =
        decode::<Claims>(token, &keys.decoding_key, &validation).map_err(|error| {
            match error.kind() {
                ErrorKind::ExpiredSignature => Error::TokenExpired,
                _ => {
                    tracing::debug!("Rejected token: {error}");
                    Error::TokenInvalid
                }
            }
        })?;

    token_data
        .claims
        .sub
        .parse::<i64>()
        .map(UserID::new)
        .map_err(|_| Error::TokenInvalid)
}
