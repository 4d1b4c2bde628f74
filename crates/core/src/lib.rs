pub mod budget;
pub mod category;
pub mod config;
pub mod credit;
pub mod money;
pub mod period;
pub mod recurring;
pub mod transaction;

pub use budget::{
    BudgetProjection, CategoryBreakdown, DebtPayoffPlan, FinancialRecommendation, FixedItem,
    MonthlyBudget, NEVER_PAYS_OFF,
};
pub use category::Category;
pub use config::{Config, ConfigError, DuplicateSettings, RecurrenceSettings};
pub use credit::{Credit, CreditType};
pub use money::{Currency, Money, MoneyError, ParseMoneyError};
pub use period::{add_months, first_of_month, month_range, DateRange};
pub use recurring::{Frequency, RecurringPattern};
pub use transaction::{AccountId, IdSequence, Transaction, TransactionId, TransactionType};
