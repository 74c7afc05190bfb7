//! HTTP handlers for transactions.

use axum::{
    Json,
    extract::State,
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    auth::AuthUser,
    category::CategoryId,
    date_format::parse_date,
    db::DbPool,
    extract::{IdPath, QueryParams, ValidJson},
    pagination::{Page, PaginationConfig},
    response::MessageResponse,
    transaction::{
        CreateTransactionRequest, Transaction, TransactionFilter, TransactionPredicate,
        UpdateTransactionRequest, count_transactions, create_transaction, delete_transaction,
        get_all_transactions, get_transactions_page, update_transaction, write_transactions_csv,
    },
    transaction_type::TransactionType,
};

/// The query string of the transaction list.
///
/// Every field is optional. Empty values are ignored, and a page or limit
/// that is not a number falls back to its default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionListQuery {
    /// "income" or "expense".
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// The ID of a category.
    pub category_id: Option<String>,
    /// The first date to include, "YYYY-MM-DD".
    pub date_from: Option<String>,
    /// The last date to include, "YYYY-MM-DD".
    pub date_to: Option<String>,
    /// The 1-based page number.
    pub page: Option<String>,
    /// The number of transactions per page.
    pub limit: Option<String>,
}

/// The query string of the CSV export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportQuery {
    /// The first date to include, "YYYY-MM-DD".
    pub date_from: Option<String>,
    /// The last date to include, "YYYY-MM-DD".
    pub date_to: Option<String>,
}

/// One page of transactions and the numbers needed to page through the rest.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionList {
    /// The transactions on this page, newest first.
    pub transactions: Vec<Transaction>,
    /// The number of transactions matching the filter across all pages.
    pub total: u64,
    /// The current page number.
    pub page: u64,
    /// The page size.
    pub limit: u64,
    /// The number of pages.
    pub total_pages: u64,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_date_param(name: &str, value: &Option<String>) -> Result<Option<Date>, Error> {
    non_empty(value)
        .map(|text| {
            parse_date(text).map_err(|_| {
                Error::InvalidParameter(format!("{name} debe tener el formato YYYY-MM-DD"))
            })
        })
        .transpose()
}

fn date_filter(date_from: &Option<String>, date_to: &Option<String>) -> Result<TransactionFilter, Error> {
    Ok(TransactionFilter::new()
        .with_optional(parse_date_param("date_from", date_from)?.map(TransactionPredicate::DateFrom))
        .with_optional(parse_date_param("date_to", date_to)?.map(TransactionPredicate::DateTo)))
}

impl TransactionListQuery {
    fn filter(&self) -> Result<TransactionFilter, Error> {
        let transaction_type = non_empty(&self.transaction_type)
            .map(|text| {
                text.parse::<TransactionType>()
                    .map_err(|_| Error::InvalidParameter("type debe ser income o expense".to_owned()))
            })
            .transpose()?;

        let category_id = non_empty(&self.category_id)
            .map(|text| {
                text.parse::<CategoryId>().map_err(|_| {
                    Error::InvalidParameter("category_id debe ser un número".to_owned())
                })
            })
            .transpose()?;

        Ok(date_filter(&self.date_from, &self.date_to)?
            .with_optional(transaction_type.map(TransactionPredicate::Type))
            .with_optional(category_id.map(TransactionPredicate::Category)))
    }

    fn page(&self, config: &PaginationConfig) -> Page {
        let parse = |value: &Option<String>| non_empty(value).and_then(|text| text.parse().ok());

        Page::new(parse(&self.page), parse(&self.limit), config)
    }
}

/// List the user's transactions, filtered and paged.
pub async fn list_transactions_endpoint(
    State(db_pool): State<DbPool>,
    State(pagination_config): State<PaginationConfig>,
    user: AuthUser,
    QueryParams(query): QueryParams<TransactionListQuery>,
) -> Result<Json<TransactionList>, Error> {
    let filter = query.filter()?;
    let page = query.page(&pagination_config);
    let connection = db_pool.get()?;

    let total = count_transactions(user.user_id, &filter, &connection)?;
    let transactions = get_transactions_page(user.user_id, &filter, page, &connection)?;

    Ok(Json(TransactionList {
        transactions,
        total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages(total),
    }))
}

/// Create a transaction for the user.
pub async fn create_transaction_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    ValidJson(request): ValidJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let connection = db_pool.get()?;

    let transaction = create_transaction(user.user_id, &request, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Update any subset of the fields of one of the user's transactions.
pub async fn update_transaction_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    IdPath(transaction_id): IdPath,
    ValidJson(request): ValidJson<UpdateTransactionRequest>,
) -> Result<Json<Transaction>, Error> {
    let connection = db_pool.get()?;

    update_transaction(transaction_id, user.user_id, &request, &connection).map(Json)
}

/// Delete one of the user's transactions.
pub async fn delete_transaction_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    IdPath(transaction_id): IdPath,
) -> Result<Json<MessageResponse>, Error> {
    let connection = db_pool.get()?;

    delete_transaction(transaction_id, user.user_id, &connection)?;

    Ok(Json(MessageResponse::new("Transacción eliminada exitosamente")))
}

/// Download the user's transactions in a date range as a CSV file.
pub async fn export_transactions_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    QueryParams(query): QueryParams<ExportQuery>,
) -> Result<impl IntoResponse, Error> {
    let filter = date_filter(&query.date_from, &query.date_to)?;
    let connection = db_pool.get()?;

    let transactions = get_all_transactions(user.user_id, &filter, &connection)?;
    let body = write_transactions_csv(&transactions)?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (CONTENT_DISPOSITION, "attachment; filename=transacciones.csv"),
        ],
        body,
    ))
}

#[cfg(test)]
mod transaction_endpoint_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        error::ErrorBody,
        test_utils::{create_test_category, get_test_server, register_user},
        transaction::export::UTF8_BOM,
    };

    use super::TransactionList;

    async fn create(server: &TestServer, token: &str, body: Value) -> Value {
        let response = server
            .post("/api/transactions")
            .authorization_bearer(token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }

    #[tokio::test]
    async fn create_then_list() {
        let (server, _) = get_test_server();
        let token = register_user(&server, "ana@example.com").await;
        let category_id = create_test_category(&server, &token, "Mercado", "expense").await;

        let created = create(
            &server,
            &token,
            json!({
                "category_id": category_id,
                "amount": 50000,
                "type": "expense",
                "description": "Mercado semanal",
                "date": "2026-02-10",
            }),
        )
        .await;

        assert_eq!(created["currency"], "COP");
        assert_eq!(created["date"], "2026-02-10");
        assert_eq!(created["category_name"], "Mercado");

        let list = server
            .get("/api/transactions")
            .authorization_bearer(&token)
            .await
            .json::<TransactionList>();
        assert_eq!(list.total, 1);
        assert_eq!(list.page, 1);
        assert_eq!(list.limit, 20);
        assert_eq!(list.total_pages, 1);
        assert_eq!(list.transactions[0].description, "Mercado semanal");
    }

    #[tokio::test]
    async fn total_pages_rounds_up_and_extra_pages_are_empty() {
        let (server, _) = get_test_server();
        let token = register_user(&server, "ana@example.com").await;
        let category_id = create_test_category(&server, &token, "Mercado", "expense").await;
        for day in 1..=7 {
            create(
                &server,
                &token,
                json!({
                    "category_id": category_id,
                    "amount": 10,
                    "type": "expense",
                    "date": format!("2026-02-{day:02}"),
                }),
            )
            .await;
        }

        let list = server
            .get("/api/transactions")
            .add_query_param("limit", 3)
            .add_query_param("page", 5)
            .authorization_bearer(&token)
            .await
            .json::<TransactionList>();

        assert_eq!(list.total, 7);
        assert_eq!(list.total_pages, 3);
        assert!(list.transactions.is_empty());
    }

    #[tokio::test]
    async fn huge_page_numbers_are_empty() {
        let (server, _) = get_test_server();
        let token = register_user(&server, "ana@example.com").await;
        let category_id = create_test_category(&server, &token, "Mercado", "expense").await;
        create(
            &server,
            &token,
            json!({
                "category_id": category_id,
                "amount": 10,
                "type": "expense",
                "date": "2026-02-01",
            }),
        )
        .await;

        for page in ["100000000000000000", "9223372036854775807"] {
            let response = server
                .get("/api/transactions")
                .add_query_param("page", page)
                .add_query_param("limit", 100)
                .authorization_bearer(&token)
                .await;

            response.assert_status(StatusCode::OK);
            let list = response.json::<TransactionList>();
            assert_eq!(list.total, 1);
            assert!(list.transactions.is_empty(), "page {page} returned {:?}", list.transactions);
        }
    }

    #[tokio::test]
    async fn bad_filter_is_invalid_parameter() {
        let (server, _) = get_test_server();
        let token = register_user(&server, "ana@example.com").await;

        let response = server
            .get("/api/transactions")
            .add_query_param("date_from", "10/02/2026")
            .authorization_bearer(&token)
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<ErrorBody>().error, "parametro_invalido");
    }

    #[tokio::test]
    async fn create_with_other_users_category_fails() {
        let (server, _) = get_test_server();
        let ana = register_user(&server, "ana@example.com").await;
        let beto = register_user(&server, "beto@example.com").await;
        let category_id = create_test_category(&server, &ana, "Mercado", "expense").await;

        let response = server
            .post("/api/transactions")
            .authorization_bearer(&beto)
            .json(&json!({
                "category_id": category_id,
                "amount": 10,
                "type": "expense",
                "date": "2026-02-10",
            }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.json::<ErrorBody>().error, "categoria_invalida");
    }

    #[tokio::test]
    async fn create_with_bad_fields_fails() {
        let (server, _) = get_test_server();
        let token = register_user(&server, "ana@example.com").await;
        let category_id = create_test_category(&server, &token, "Mercado", "expense").await;

        for body in [
            json!({ "category_id": category_id, "amount": 0, "type": "expense", "date": "2026-02-10" }),
            json!({ "category_id": category_id, "amount": 10, "type": "transfer", "date": "2026-02-10" }),
            json!({ "category_id": category_id, "amount": 10, "type": "expense", "date": "10-02-2026" }),
            json!({ "category_id": category_id, "amount": 10, "type": "expense", "date": "2026-02-10", "currency": "PESO" }),
        ] {
            let response = server
                .post("/api/transactions")
                .authorization_bearer(&token)
                .json(&body)
                .await;

            response.assert_status_bad_request();
            assert_eq!(response.json::<ErrorBody>().error, "datos_invalidos");
        }
    }

    #[tokio::test]
    async fn update_and_delete() {
        let (server, _) = get_test_server();
        let token = register_user(&server, "ana@example.com").await;
        let category_id = create_test_category(&server, &token, "Mercado", "expense").await;
        let created = create(
            &server,
            &token,
            json!({ "category_id": category_id, "amount": 10, "type": "expense", "date": "2026-02-10" }),
        )
        .await;
        let path = format!("/api/transactions/{}", created["id"]);

        let empty = server.put(&path).authorization_bearer(&token).json(&json!({})).await;
        empty.assert_status_bad_request();

        let updated = server
            .put(&path)
            .authorization_bearer(&token)
            .json(&json!({ "amount": 12.5 }))
            .await;
        updated.assert_status_ok();
        assert_eq!(updated.json::<Value>()["amount"], 12.5);

        server
            .delete(&path)
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
        server
            .delete(&path)
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn export_is_bom_prefixed_csv() {
        let (server, _) = get_test_server();
        let token = register_user(&server, "ana@example.com").await;
        let category_id = create_test_category(&server, &token, "Mercado", "expense").await;
        for date in ["2026-01-15", "2026-02-10"] {
            create(
                &server,
                &token,
                json!({ "category_id": category_id, "amount": 10, "type": "expense", "date": date }),
            )
            .await;
        }

        let response = server
            .get("/api/transactions/export")
            .add_query_param("date_from", "2026-02-01")
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        response.assert_header("content-type", "text/csv; charset=utf-8");
        response.assert_header("content-disposition", "attachment; filename=transacciones.csv");
        let bytes = response.as_bytes();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("2026-02-10,Gasto,Mercado,,10.00,COP"));
    }

    #[tokio::test]
    async fn requires_token() {
        let (server, _) = get_test_server();

        server.get("/api/transactions").await.assert_status_unauthorized();
    }
}
