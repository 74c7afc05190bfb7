//! Transactions record money that was spent or earned.
//!
//! This module contains:
//! - The `Transaction` model and its database functions
//! - Filtered, paged queries over a user's transactions
//! - The CSV export
//! - The HTTP handlers

mod core;
mod endpoints;
mod export;
mod query;

pub use core::{
    CreateTransactionRequest, DEFAULT_CURRENCY, Transaction, TransactionId,
    UpdateTransactionRequest, create_transaction, create_transaction_table, delete_transaction,
    get_transaction, update_transaction,
};
pub use endpoints::{
    ExportQuery, TransactionList, TransactionListQuery, create_transaction_endpoint,
    delete_transaction_endpoint, export_transactions_endpoint, list_transactions_endpoint,
    update_transaction_endpoint,
};
pub use export::{CSV_HEADER, UTF8_BOM, write_transactions_csv};
pub use query::{
    TransactionFilter, TransactionPredicate, count_transactions, get_all_transactions,
    get_transactions_page,
};
