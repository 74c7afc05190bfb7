//! The user's preferences.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    Error,
    auth::AuthUser,
    db::DbPool,
    extract::ValidJson,
    user::{get_user_by_id, set_include_savings_in_total},
};

/// The user's preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Whether savings balances are counted in the user's overall total.
    pub include_savings_in_total: bool,
}

/// The body of a request to change the user's preferences.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct UpdateUserSettingsRequest {
    /// Required. The handler rejects a request without it.
    pub include_savings_in_total: Option<bool>,
}

/// Get the user's preferences.
pub async fn get_settings_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
) -> Result<Json<UserSettings>, Error> {
    let connection = db_pool.get()?;

    let user = get_user_by_id(user.user_id, &connection)?;

    Ok(Json(UserSettings {
        include_savings_in_total: user.include_savings_in_total,
    }))
}

/// Change the user's preferences.
pub async fn update_settings_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    ValidJson(request): ValidJson<UpdateUserSettingsRequest>,
) -> Result<Json<UserSettings>, Error> {
    let include_savings_in_total = request.include_savings_in_total.ok_or_else(|| {
        Error::InvalidInput("include_savings_in_total es requerido".to_owned())
    })?;

    let connection = db_pool.get()?;

    set_include_savings_in_total(user.user_id, include_savings_in_total, &connection)?;

    Ok(Json(UserSettings {
        include_savings_in_total,
    }))
}
