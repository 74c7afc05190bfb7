//! The API endpoint URIs.
//!
//! Routes that take a resource ID use the `{id}` path parameter.

/// The liveness probe.
pub const HEALTH: &str = "/api/health";

/// The route for registering a user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for requesting a password reset code.
pub const FORGOT_PASSWORD: &str = "/api/auth/forgot-password";
/// The route for resetting a password with a one-time code.
pub const RESET_PASSWORD: &str = "/api/auth/reset-password";

/// The route to list and create categories.
pub const CATEGORIES: &str = "/api/categories";
/// The route to update and delete a category.
pub const CATEGORY: &str = "/api/categories/{id}";

/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route to update and delete a transaction.
pub const TRANSACTION: &str = "/api/transactions/{id}";
/// The route to download transactions as CSV.
pub const TRANSACTIONS_EXPORT: &str = "/api/transactions/export";

/// The route to list and set budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to delete a budget.
pub const BUDGET: &str = "/api/budgets/{id}";

/// The route for the monthly report.
pub const MONTHLY_REPORT: &str = "/api/reports/monthly";
/// The route for the yearly report.
pub const YEARLY_REPORT: &str = "/api/reports/yearly";

/// The route to list and create savings accounts.
pub const SAVINGS: &str = "/api/savings";
/// The route to update and delete a savings account.
pub const SAVINGS_ACCOUNT: &str = "/api/savings/{id}";
/// The route to deposit into or withdraw from a savings account.
pub const SAVINGS_ADJUST: &str = "/api/savings/{id}/adjust";

/// The route for the user's preferences.
pub const USER_SETTINGS: &str = "/api/user/settings";
