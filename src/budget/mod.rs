//! Monthly spending limits per category.

mod core;
mod endpoints;

pub use core::{
    Budget, BudgetId, SetBudgetRequest, create_budget_table, delete_budget, get_budget,
    get_budgets_for_month, set_budget,
};
pub use endpoints::{
    BudgetList, delete_budget_endpoint, list_budgets_endpoint, set_budget_endpoint,
};
