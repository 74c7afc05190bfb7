//! HTTP handlers for monthly budgets.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::AuthUser,
    budget::{Budget, SetBudgetRequest, delete_budget, get_budgets_for_month, set_budget},
    db::DbPool,
    extract::{IdPath, QueryParams, ValidJson},
    period::MonthQuery,
    response::MessageResponse,
};

/// The response body for the budgets of a month.
#[derive(Debug, Serialize, Deserialize)]
pub struct BudgetList {
    /// The budgets ordered by category name.
    pub budgets: Vec<Budget>,
}

/// List the user's budgets for `?month=M&year=Y` with the amount spent so far.
pub async fn list_budgets_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    QueryParams(query): QueryParams<MonthQuery>,
) -> Result<Json<BudgetList>, Error> {
    let period = query.period()?;
    let connection = db_pool.get()?;

    let budgets = get_budgets_for_month(user.user_id, period.month, period.year, &connection)?;

    Ok(Json(BudgetList { budgets }))
}

/// Create the budget for a category and month, or replace its limit.
pub async fn set_budget_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    ValidJson(request): ValidJson<SetBudgetRequest>,
) -> Result<(StatusCode, Json<Budget>), Error> {
    let connection = db_pool.get()?;

    let budget = set_budget(user.user_id, &request, &connection)?;

    Ok((StatusCode::CREATED, Json(budget)))
}

/// Delete one of the user's budgets.
pub async fn delete_budget_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    IdPath(budget_id): IdPath,
) -> Result<Json<MessageResponse>, Error> {
    let connection = db_pool.get()?;

    delete_budget(budget_id, user.user_id, &connection)?;

    Ok(Json(MessageResponse::new("Presupuesto eliminado exitosamente")))
}
