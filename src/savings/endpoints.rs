//! HTTP handlers for savings accounts.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::AuthUser,
    db::DbPool,
    extract::{IdPath, ValidJson},
    response::MessageResponse,
    savings::{
        AdjustBalanceRequest, CreateSavingsAccountRequest, SavingsAccount,
        UpdateSavingsAccountRequest, adjust_balance, create_savings_account,
        delete_savings_account, get_savings_accounts, update_savings_account,
    },
};

/// The response body for the list of savings accounts.
#[derive(Debug, Serialize, Deserialize)]
pub struct SavingsAccountList {
    /// The accounts, oldest first.
    pub accounts: Vec<SavingsAccount>,
    /// The sum of the balances.
    pub total: f64,
}

/// List the user's savings accounts and their combined balance.
pub async fn list_savings_accounts_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
) -> Result<Json<SavingsAccountList>, Error> {
    let connection = db_pool.get()?;

    let accounts = get_savings_accounts(user.user_id, &connection)?;
    let total = accounts.iter().map(|account| account.balance).sum();

    Ok(Json(SavingsAccountList { accounts, total }))
}

/// Create a savings account for the user.
pub async fn create_savings_account_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    ValidJson(request): ValidJson<CreateSavingsAccountRequest>,
) -> Result<(StatusCode, Json<SavingsAccount>), Error> {
    let connection = db_pool.get()?;

    let account = create_savings_account(user.user_id, &request, &connection)?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// Update one of the user's savings accounts.
pub async fn update_savings_account_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    IdPath(account_id): IdPath,
    ValidJson(request): ValidJson<UpdateSavingsAccountRequest>,
) -> Result<Json<SavingsAccount>, Error> {
    let connection = db_pool.get()?;

    update_savings_account(account_id, user.user_id, &request, &connection).map(Json)
}

/// Deposit into or withdraw from one of the user's savings accounts.
pub async fn adjust_balance_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    IdPath(account_id): IdPath,
    ValidJson(request): ValidJson<AdjustBalanceRequest>,
) -> Result<Json<SavingsAccount>, Error> {
    let connection = db_pool.get()?;

    adjust_balance(account_id, user.user_id, &request, &connection).map(Json)
}

/// Delete one of the user's savings accounts.
pub async fn delete_savings_account_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    IdPath(account_id): IdPath,
) -> Result<Json<MessageResponse>, Error> {
    let connection = db_pool.get()?;

    delete_savings_account(account_id, user.user_id, &connection)?;

    Ok(Json(MessageResponse::new("Cuenta de ahorro eliminada")))
}
