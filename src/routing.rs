//! Application router configuration with protected and unprotected route definitions.

use std::{any::Any, time::Duration};

use axum::{
    Json, Router,
    extract::{MatchedPath, Request},
    http::{
        HeaderValue, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    sensitive_headers::SetSensitiveHeadersLayer,
    trace::TraceLayer,
};

use crate::{
    AppState, Error,
    auth::{
        auth_guard, forgot_password_endpoint, log_in_endpoint, register_endpoint,
        reset_password_endpoint,
    },
    budget::{delete_budget_endpoint, list_budgets_endpoint, set_budget_endpoint},
    category::{
        create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
        update_category_endpoint,
    },
    endpoints,
    error::{ErrorBody, INTERNAL_ERROR_MESSAGE},
    health::health_endpoint,
    logging::logging_middleware,
    report::{monthly_report_endpoint, yearly_report_endpoint},
    savings::{
        adjust_balance_endpoint, create_savings_account_endpoint, delete_savings_account_endpoint,
        list_savings_accounts_endpoint, update_savings_account_endpoint,
    },
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, export_transactions_endpoint,
        list_transactions_endpoint, update_transaction_endpoint,
    },
    user_settings::{get_settings_endpoint, update_settings_endpoint},
};

/// How long browsers may cache a CORS preflight response.
const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

/// Return a router with all the app's routes.
///
/// `allowed_origins` are the origins browsers may call the API from.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::HEALTH, get(health_endpoint))
        .route(endpoints::REGISTER, post(register_endpoint))
        .route(endpoints::LOG_IN, post(log_in_endpoint))
        .route(endpoints::FORGOT_PASSWORD, post(forgot_password_endpoint))
        .route(endpoints::RESET_PASSWORD, post(reset_password_endpoint));

    let protected_routes = Router::new()
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            put(update_category_endpoint).delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTIONS_EXPORT, get(export_transactions_endpoint))
        .route(
            endpoints::TRANSACTION,
            put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::BUDGETS,
            get(list_budgets_endpoint).post(set_budget_endpoint),
        )
        .route(endpoints::BUDGET, delete(delete_budget_endpoint))
        .route(endpoints::MONTHLY_REPORT, get(monthly_report_endpoint))
        .route(endpoints::YEARLY_REPORT, get(yearly_report_endpoint))
        .route(
            endpoints::SAVINGS,
            get(list_savings_accounts_endpoint).post(create_savings_account_endpoint),
        )
        .route(
            endpoints::SAVINGS_ACCOUNT,
            put(update_savings_account_endpoint).delete(delete_savings_account_endpoint),
        )
        .route(endpoints::SAVINGS_ADJUST, post(adjust_balance_endpoint))
        .route(
            endpoints::USER_SETTINGS,
            get(get_settings_endpoint).patch(update_settings_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(
            state.jwt_keys.clone(),
            auth_guard,
        ));

    let router = protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state);

    add_layers(router, allowed_origins)
}

/// Wrap `router` in the panic, logging, tracing, CORS and sensitive header layers.
fn add_layers(router: Router, allowed_origins: &[String]) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(logging_middleware))
        .layer(tracing_layer)
        .layer(cors_layer(allowed_origins))
        .layer(SetSensitiveHeadersLayer::new([AUTHORIZATION]))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!("Ignoring invalid CORS origin {origin:?}: {error}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ORIGIN, CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(CORS_MAX_AGE)
}

/// Turn a panic in a handler into a 500 response.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else {
        "unknown panic payload".to_owned()
    };

    tracing::error!("A request handler panicked: {details}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "internal_server_error".to_owned(),
            message: INTERNAL_ERROR_MESSAGE.to_owned(),
        }),
    )
        .into_response()
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod routing_tests {
    use axum::{
        Router,
        http::{HeaderValue, Method, StatusCode},
        routing::get,
    };
    use axum_test::TestServer;

    use crate::{error::ErrorBody, test_utils::get_test_server};

    use super::add_layers;

    async fn panics() -> &'static str {
        panic!("boom");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (server, _) = get_test_server();

        let response = server.get("/api/nope").await;

        response.assert_status_not_found();
        assert_eq!(response.json::<ErrorBody>().error, "no_encontrado");
    }

    #[tokio::test]
    async fn panic_becomes_500_and_server_keeps_serving() {
        let app = add_layers(
            Router::new()
                .route("/panic", get(panics))
                .route("/ok", get(|| async { "ok" })),
            &[],
        );
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server.get("/panic").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<ErrorBody>().error, "internal_server_error");

        server.get("/ok").await.assert_status_ok();
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let app = add_layers(
            Router::new().route("/ok", get(|| async { "ok" })),
            &["http://localhost:5173".to_owned()],
        );
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server
            .method(Method::OPTIONS, "/ok")
            .add_header("Origin", "http://localhost:5173")
            .add_header("Access-Control-Request-Method", "GET")
            .await;

        assert_eq!(
            response.headers().get("access-control-allow-origin"),
            Some(&HeaderValue::from_static("http://localhost:5173"))
        );
        assert_eq!(
            response.headers().get("access-control-allow-credentials"),
            Some(&HeaderValue::from_static("true"))
        );
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let (server, _) = get_test_server();

        for path in [
            "/api/categories",
            "/api/transactions",
            "/api/budgets",
            "/api/savings",
            "/api/reports/yearly",
            "/api/user/settings",
        ] {
            let response = server.get(path).await;

            response.assert_status_unauthorized();
            assert_eq!(response.json::<ErrorBody>().error, "no_autorizado");
        }
    }
}
