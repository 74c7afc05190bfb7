//! Categories group a user's transactions and budgets.

mod catalog;
mod db;
mod domain;
mod endpoints;

pub use catalog::{
    DEFAULT_CATEGORIES, DefaultCategory, get_or_seed_categories, seed_default_categories,
};
pub use db::{
    count_categories, create_category, create_category_table, delete_category, get_categories,
    get_category, update_category,
};
pub use domain::{
    Category, CategoryId, CreateCategoryRequest, UpdateCategoryRequest, validate_hex_color,
};
pub use endpoints::{
    CategoryList, create_category_endpoint, delete_category_endpoint, list_categories_endpoint,
    update_category_endpoint,
};
