use cashwise_core::{
    AccountId, Category, Credit, CreditType, Currency, DateRange, Frequency, Money,
    RecurringPattern, Transaction, TransactionId, TransactionType,
};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub type DbPool = Pool<Sqlite>;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Corrupt {column} value in database: '{value}'")]
    Corrupt { column: &'static str, value: String },
}

type Result<T> = std::result::Result<T, StorageError>;

/// Opens the database at `path`, creating the file and schema if needed.
pub async fn create_db(path: &Path) -> Result<DbPool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;
    tracing::debug!(path = %path.display(), "database ready");

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            amount_minor INTEGER NOT NULL,
            currency TEXT NOT NULL,
            kind TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'uncategorized',
            counterparty TEXT,
            description TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recurring_patterns (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            counterparty TEXT NOT NULL,
            amount_minor INTEGER NOT NULL,
            currency TEXT NOT NULL,
            frequency TEXT NOT NULL,
            category TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS credits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            credit_type TEXT NOT NULL,
            currency TEXT NOT NULL,
            original_minor INTEGER NOT NULL,
            balance_minor INTEGER NOT NULL,
            annual_interest_rate REAL NOT NULL,
            minimum_payment_minor INTEGER NOT NULL,
            lender TEXT,
            due_day INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn parse_column<T: FromStr<Err = String>>(column: &'static str, value: &str) -> Result<T> {
    value.parse().map_err(|_| StorageError::Corrupt {
        column,
        value: value.to_string(),
    })
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| StorageError::Corrupt {
        column: "date",
        value: value.to_string(),
    })
}

// ── Transactions ──────────────────────────────────────────────────────────────

type TransactionRow = (i64, i64, String, i64, String, String, String, Option<String>, String);

const TRANSACTION_COLUMNS: &str =
    "id, account_id, date, amount_minor, currency, kind, category, counterparty, description";

fn transaction_from_row(r: TransactionRow) -> Result<Transaction> {
    let currency: Currency = parse_column("currency", &r.4)?;
    Ok(Transaction {
        id: TransactionId(r.0),
        account_id: AccountId(r.1),
        date: parse_date(&r.2)?,
        amount: Money::from_minor(r.3, currency),
        kind: parse_column::<TransactionType>("kind", &r.5)?,
        category: parse_column::<Category>("category", &r.6)?,
        counterparty: r.7,
        description: r.8,
    })
}

/// Inserts every transaction in one database transaction. Rows whose id is
/// already stored are left untouched; returns how many were inserted.
pub async fn insert_transactions(pool: &DbPool, transactions: &[Transaction]) -> Result<u64> {
    let mut db_tx = pool.begin().await?;
    let mut inserted = 0;

    for tx in transactions {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO transactions (id, account_id, date, amount_minor, currency, kind, category, counterparty, description) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(tx.id.0)
        .bind(tx.account_id.0)
        .bind(tx.date.format(DATE_FORMAT).to_string())
        .bind(tx.amount.amount_minor)
        .bind(tx.amount.currency.code())
        .bind(tx.kind.to_string())
        .bind(tx.category.as_str())
        .bind(tx.counterparty.as_deref())
        .bind(&tx.description)
        .execute(&mut *db_tx)
        .await?;
        inserted += result.rows_affected();
    }

    db_tx.commit().await?;
    tracing::debug!(requested = transactions.len(), inserted, "stored transactions");
    Ok(inserted)
}

pub async fn get_transactions(pool: &DbPool) -> Result<Vec<Transaction>> {
    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY date, id"
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(transaction_from_row).collect()
}

/// Transactions dated within `range`, inclusive at both ends.
pub async fn get_transactions_in_range(
    pool: &DbPool,
    range: DateRange,
) -> Result<Vec<Transaction>> {
    let rows = sqlx::query_as::<_, TransactionRow>(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE date >= ? AND date <= ? ORDER BY date, id"
    ))
    .bind(range.start.format(DATE_FORMAT).to_string())
    .bind(range.end.format(DATE_FORMAT).to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(transaction_from_row).collect()
}

pub async fn max_transaction_id(pool: &DbPool) -> Result<Option<TransactionId>> {
    let row: (Option<i64>,) = sqlx::query_as("SELECT MAX(id) FROM transactions")
        .fetch_one(pool)
        .await?;
    Ok(row.0.map(TransactionId))
}

// ── Recurring patterns ────────────────────────────────────────────────────────

type PatternRow = (i64, String, i64, String, String, Option<String>, i64);

pub async fn insert_recurring_pattern(pool: &DbPool, pattern: &RecurringPattern) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO recurring_patterns (counterparty, amount_minor, currency, frequency, category, is_active) VALUES (?, ?, ?, ?, ?, ?)"
    )
    .bind(&pattern.counterparty)
    .bind(pattern.amount.amount_minor)
    .bind(pattern.amount.currency.code())
    .bind(pattern.frequency.to_string())
    .bind(pattern.category.map(Category::as_str))
    .bind(pattern.active as i64)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_recurring_patterns(
    pool: &DbPool,
    active_only: bool,
) -> Result<Vec<RecurringPattern>> {
    let rows = sqlx::query_as::<_, PatternRow>(
        "SELECT id, counterparty, amount_minor, currency, frequency, category, is_active FROM recurring_patterns WHERE is_active = 1 OR ? = 0 ORDER BY id"
    )
    .bind(active_only as i64)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            let currency: Currency = parse_column("currency", &r.3)?;
            Ok(RecurringPattern {
                id: Some(r.0),
                counterparty: r.1,
                amount: Money::from_minor(r.2, currency),
                frequency: parse_column::<Frequency>("frequency", &r.4)?,
                category: r
                    .5
                    .as_deref()
                    .map(|c| parse_column::<Category>("category", c))
                    .transpose()?,
                active: r.6 != 0,
            })
        })
        .collect()
}

/// Returns `false` when no pattern has that id.
pub async fn deactivate_recurring_pattern(pool: &DbPool, id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE recurring_patterns SET is_active = 0 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ── Credits ───────────────────────────────────────────────────────────────────

type CreditRow = (i64, String, String, String, i64, i64, f64, i64, Option<String>, i64);

pub async fn insert_credit(pool: &DbPool, credit: &Credit) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO credits (name, credit_type, currency, original_minor, balance_minor, annual_interest_rate, minimum_payment_minor, lender, due_day) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&credit.name)
    .bind(credit.credit_type.to_string())
    .bind(credit.current_balance.currency.code())
    .bind(credit.original_amount.amount_minor)
    .bind(credit.current_balance.amount_minor)
    .bind(credit.annual_interest_rate)
    .bind(credit.minimum_payment.amount_minor)
    .bind(credit.lender.as_deref())
    .bind(i64::from(credit.due_day))
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_credits(pool: &DbPool) -> Result<Vec<Credit>> {
    let rows = sqlx::query_as::<_, CreditRow>(
        "SELECT id, name, credit_type, currency, original_minor, balance_minor, annual_interest_rate, minimum_payment_minor, lender, due_day FROM credits ORDER BY id"
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            let currency: Currency = parse_column("currency", &r.3)?;
            let due_day = u8::try_from(r.9).map_err(|_| StorageError::Corrupt {
                column: "due_day",
                value: r.9.to_string(),
            })?;
            Ok(Credit {
                id: Some(r.0),
                name: r.1,
                credit_type: parse_column::<CreditType>("credit_type", &r.2)?,
                original_amount: Money::from_minor(r.4, currency),
                current_balance: Money::from_minor(r.5, currency),
                annual_interest_rate: r.6,
                minimum_payment: Money::from_minor(r.7, currency),
                lender: r.8,
                due_day,
            })
        })
        .collect()
}

/// Returns `false` when no credit has that id.
pub async fn update_credit_balance(pool: &DbPool, id: i64, balance: Money) -> Result<bool> {
    let result = sqlx::query("UPDATE credits SET balance_minor = ? WHERE id = ?")
        .bind(balance.amount_minor)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ── Settings ──────────────────────────────────────────────────────────────────

pub async fn get_setting(pool: &DbPool, key: &str) -> Result<Option<String>> {
    let row = sqlx::query_as::<_, (String,)>("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.0))
}

pub async fn set_setting(pool: &DbPool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value"
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}
