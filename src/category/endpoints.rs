//! HTTP handlers for listing, creating, updating and deleting categories.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::AuthUser,
    category::{
        Category, CreateCategoryRequest, UpdateCategoryRequest, create_category,
        delete_category, get_or_seed_categories, update_category,
    },
    db::DbPool,
    extract::{IdPath, ValidJson},
    response::MessageResponse,
};

/// The response body for a list of categories.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryList {
    /// The user's categories ordered by type and then name.
    pub categories: Vec<Category>,
}

/// List the user's categories.
///
/// A user without any categories who has never received the default catalog
/// is given it before the list is returned.
pub async fn list_categories_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
) -> Result<Json<CategoryList>, Error> {
    let connection = db_pool.get()?;

    let categories = get_or_seed_categories(user.user_id, &connection)?;

    Ok(Json(CategoryList { categories }))
}

/// Create a category for the user.
pub async fn create_category_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    ValidJson(request): ValidJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let connection = db_pool.get()?;

    let category = create_category(user.user_id, &request, &connection)?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Update the name, nickname, colour or icon of one of the user's categories.
pub async fn update_category_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    IdPath(category_id): IdPath,
    ValidJson(request): ValidJson<UpdateCategoryRequest>,
) -> Result<Json<Category>, Error> {
    let connection = db_pool.get()?;

    update_category(category_id, user.user_id, &request, &connection).map(Json)
}

/// Delete one of the user's categories.
pub async fn delete_category_endpoint(
    State(db_pool): State<DbPool>,
    user: AuthUser,
    IdPath(category_id): IdPath,
) -> Result<Json<MessageResponse>, Error> {
    let connection = db_pool.get()?;

    delete_category(category_id, user.user_id, &connection)?;

    Ok(Json(MessageResponse::new("Categoría eliminada exitosamente")))
}
