//! Authentication middleware that validates bearer tokens and passes the
//! caller's identity on to the route handlers.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{
    Error,
    auth::token::{JwtKeys, decode_token},
    user::UserID,
};

/// The identity of the caller of a protected route.
///
/// Inserted into the request by [auth_guard] and taken out again by handlers
/// that list it as an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    /// The ID of the user the bearer token was issued to.
    pub user_id: UserID,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(Error::MissingToken)
    }
}

/// Middleware function that checks for a valid bearer token.
///
/// The caller's [AuthUser] is placed into the request and the request executed
/// normally if the token is valid, otherwise a 401 error response is returned.
pub async fn auth_guard(State(keys): State<JwtKeys>, mut request: Request, next: Next) -> Response {
    let user_id = match get_user_id(&request, &keys) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    request.extensions_mut().insert(AuthUser { user_id });

    next.run(request).await
}

fn get_user_id(request: &Request, keys: &JwtKeys) -> Result<UserID, Error> {
    let headers = request.headers();

    if !headers.contains_key(AUTHORIZATION) {
        return Err(Error::MissingToken);
    }

    let Authorization(bearer) = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or(Error::TokenInvalid)?;

    decode_token(bearer.token(), keys)
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{Json, Router, middleware, routing::get};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        auth::{
            AuthUser,
            token::{JwtKeys, encode_token},
        },
        error::ErrorBody,
        user::UserID,
    };

    use super::auth_guard;

    async fn whoami(user: AuthUser) -> Json<Value> {
        Json(json!({ "user_id": user.user_id.as_i64() }))
    }

    fn get_test_server(keys: JwtKeys) -> TestServer {
        let app = Router::new()
            .route("/protected", get(whoami))
            .layer(middleware::from_fn_with_state(keys, auth_guard));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn valid_token_reaches_handler() {
        let keys = JwtKeys::new("foobar");
        let token = encode_token(UserID::new(7), &keys).unwrap();
        let server = get_test_server(keys);

        let response = server
            .get("/protected")
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "user_id": 7 }));
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let server = get_test_server(JwtKeys::new("foobar"));

        let response = server.get("/protected").await;

        response.assert_status_unauthorized();
        assert_eq!(response.json::<ErrorBody>().error, "no_autorizado");
    }

    #[tokio::test]
    async fn non_bearer_header_is_invalid() {
        let server = get_test_server(JwtKeys::new("foobar"));

        let response = server
            .get("/protected")
            .add_header("Authorization", "Basic dXNlcjpwYXNz")
            .await;

        response.assert_status_unauthorized();
        assert_eq!(response.json::<ErrorBody>().error, "token_invalido");
    }

    #[tokio::test]
    async fn token_from_other_secret_is_invalid() {
        let token = encode_token(UserID::new(7), &JwtKeys::new("other")).unwrap();
        let server = get_test_server(JwtKeys::new("foobar"));

        let response = server
            .get("/protected")
            .authorization_bearer(token)
            .await;

        response.assert_status_unauthorized();
        assert_eq!(response.json::<ErrorBody>().error, "token_invalido");
    }
}
