pub mod db;

pub use db::{
    create_db, deactivate_recurring_pattern, get_credits, get_recurring_patterns, get_setting,
    get_transactions, get_transactions_in_range, insert_credit, insert_recurring_pattern,
    insert_transactions, max_transaction_id, set_setting, update_credit_balance, DbPool,
    StorageError,
};
