//! Category domain types and request validation.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::{Validate, ValidationError};

use crate::{database_id::DatabaseId, transaction_type::TransactionType, user::UserID};

/// The database ID of a category.
pub type CategoryId = DatabaseId;

/// A user-owned label that groups transactions of the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The user that owns the category.
    pub user_id: UserID,
    /// The display name, e.g. "Comida".
    pub name: String,
    /// An optional name the user prefers over `name`.
    pub nickname: Option<String>,
    /// A "#RRGGBB" colour.
    pub color: String,
    /// The key of the icon shown next to the category.
    pub icon: String,
    /// Whether the category is for income or expenses. Never changes after creation.
    #[serde(rename = "type")]
    pub category_type: TransactionType,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Check that `color` is a "#RRGGBB" hex colour.
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let is_hex_color = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());

    if is_hex_color {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color")
            .with_message("el color debe tener el formato #RRGGBB".into()))
    }
}

fn validate_hex_color_or_empty(color: &str) -> Result<(), ValidationError> {
    if color.is_empty() {
        return Ok(());
    }

    validate_hex_color(color)
}

/// The body of a request to create a category.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    /// The display name, 1 to 100 characters.
    #[validate(length(min = 1, max = 100, message = "el nombre debe tener entre 1 y 100 caracteres"))]
    pub name: String,
    /// A "#RRGGBB" colour.
    #[validate(custom(function = "validate_hex_color"))]
    pub color: String,
    /// The icon key.
    #[validate(length(min = 1, message = "el ícono es requerido"))]
    pub icon: String,
    /// Income or expense.
    #[serde(rename = "type")]
    pub category_type: TransactionType,
}

/// The body of a request to update a category.
///
/// Missing or empty fields leave the stored value as is, except `nickname`
/// where an empty string clears the nickname.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    /// The new display name.
    #[validate(length(max = 100, message = "el nombre debe tener como máximo 100 caracteres"))]
    pub name: Option<String>,
    /// The new nickname.
    #[validate(length(max = 100, message = "el apodo debe tener como máximo 100 caracteres"))]
    pub nickname: Option<String>,
    /// The new colour.
    #[validate(custom(function = "validate_hex_color_or_empty"))]
    pub color: Option<String>,
    /// The new icon key.
    pub icon: Option<String>,
}
