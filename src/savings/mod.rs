//! Savings accounts hold money outside of the monthly income and expenses.

mod core;
mod endpoints;

pub use core::{
    AdjustBalanceRequest, AdjustmentType, CreateSavingsAccountRequest, SavingsAccount,
    SavingsAccountId, UpdateSavingsAccountRequest, adjust_balance, create_savings_account,
    create_savings_account_table, delete_savings_account, get_savings_account,
    get_savings_accounts, update_savings_account,
};
pub use endpoints::{
    SavingsAccountList, adjust_balance_endpoint, create_savings_account_endpoint,
    delete_savings_account_endpoint, list_savings_accounts_endpoint,
    update_savings_account_endpoint,
};
