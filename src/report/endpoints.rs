//! HTTP handlers for the monthly and yearly reports.

use axum::{Json, extract::State};

use crate::{
    Error,
    auth::AuthUser,
    db::DbPool,
    extract::QueryParams,
    period::{MonthQuery, YearQuery},
    report::{MonthlySummary, YearlySummary, get_monthly_summary, get_yearly_summary},
};

/// Summarise the user's transactions for `?month=M&year=Y`.
pub async fn monthly_report_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    QueryParams(query): QueryParams<MonthQuery>,
) -> Result<Json<MonthlySummary>, Error> {
    let period = query.period()?;
    let connection = db_pool.get()?;

    get_monthly_summary(user.user_id, period.month, period.year, &connection).map(Json)
}

/// Summarise the user's transactions for `?year=Y`, month by month.
pub async fn yearly_report_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    QueryParams(query): QueryParams<YearQuery>,
) -> Result<Json<YearlySummary>, Error> {
    let year = query.year()?;
    let connection = db_pool.get()?;

    get_yearly_summary(user.user_id, year, &connection).map(Json)
}
