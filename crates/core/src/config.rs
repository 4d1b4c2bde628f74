//! TOML configuration: detector tolerances plus the recurring patterns and
//! credits a user declares by hand. Sections the core does not understand
//! (import rules and profiles) are ignored here and read by the import crate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::category::Category;
use crate::credit::{Credit, CreditType};
use crate::money::{Currency, Money};
use crate::recurring::{Frequency, RecurringPattern};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: String, value: Decimal },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateSettings {
    pub date_window_days: i64,
    pub amount_tolerance_minor: i64,
    pub normalize_counterparty: bool,
}

impl Default for DuplicateSettings {
    fn default() -> Self {
        Self {
            date_window_days: 1,
            amount_tolerance_minor: 0,
            normalize_counterparty: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceSettings {
    /// Relative tolerance when clustering amounts (0.05 = 5%).
    pub amount_tolerance: f64,
    pub min_occurrences: usize,
    /// Minimum pattern confidence for a detection to be persisted.
    pub save_threshold: u8,
}

impl Default for RecurrenceSettings {
    fn default() -> Self {
        Self {
            amount_tolerance: 0.05,
            min_occurrences: 2,
            save_threshold: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEntry {
    pub counterparty: String,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub category: Option<Category>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditEntry {
    pub name: String,
    #[serde(default)]
    pub credit_type: CreditType,
    /// Defaults to the current balance.
    pub original_amount: Option<Decimal>,
    pub current_balance: Decimal,
    pub annual_interest_rate: f64,
    pub minimum_payment: Decimal,
    pub lender: Option<String>,
    #[serde(default = "default_due_day")]
    pub due_day: u8,
}

fn default_true() -> bool {
    true
}

fn default_due_day() -> u8 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub currency: Currency,
    pub emergency_fund: Decimal,
    pub duplicates: DuplicateSettings,
    pub recurrence: RecurrenceSettings,
    pub recurring: Vec<PatternEntry>,
    pub credits: Vec<CreditEntry>,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn emergency_fund(&self) -> Result<Money, ConfigError> {
        self.money("emergency_fund", self.emergency_fund)
    }

    pub fn recurring_patterns(&self) -> Result<Vec<RecurringPattern>, ConfigError> {
        self.recurring
            .iter()
            .map(|entry| {
                let field = format!("recurring '{}'", entry.counterparty);
                Ok(RecurringPattern {
                    id: None,
                    counterparty: entry.counterparty.clone(),
                    amount: self.money(&field, entry.amount)?,
                    frequency: entry.frequency,
                    category: entry.category,
                    active: entry.active,
                })
            })
            .collect()
    }

    pub fn credits(&self) -> Result<Vec<Credit>, ConfigError> {
        self.credits
            .iter()
            .map(|entry| {
                let field = format!("credit '{}'", entry.name);
                let current_balance = self.money(&field, entry.current_balance)?;
                let original_amount = match entry.original_amount {
                    Some(amount) => self.money(&field, amount)?,
                    None => current_balance,
                };
                Ok(Credit {
                    id: None,
                    name: entry.name.clone(),
                    credit_type: entry.credit_type,
                    original_amount,
                    current_balance,
                    annual_interest_rate: entry.annual_interest_rate,
                    minimum_payment: self.money(&field, entry.minimum_payment)?,
                    lender: entry.lender.clone(),
                    due_day: entry.due_day,
                })
            })
            .collect()
    }

    fn money(&self, field: &str, value: Decimal) -> Result<Money, ConfigError> {
        Money::from_decimal(value, self.currency).ok_or_else(|| ConfigError::InvalidAmount {
            field: field.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
currency = "EUR"
emergency_fund = "1500.00"

[duplicates]
date_window_days = 3

[recurrence]
min_occurrences = 3

[[recurring]]
counterparty = "Netflix"
amount = "-17.99"
frequency = "monthly"
category = "subscriptions"

[[recurring]]
counterparty = "Employer"
amount = "2500"
frequency = "biweekly"
active = false

[[credits]]
name = "Visa"
credit_type = "credit_card"
current_balance = "3200.00"
annual_interest_rate = 0.2299
minimum_payment = "95.00"
due_day = 15

[[rules]]
name = "ignored by core"
"#;

    #[test]
    fn defaults_when_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.currency, Currency::Usd);
        assert_eq!(config.duplicates, DuplicateSettings::default());
        assert_eq!(config.recurrence.amount_tolerance, 0.05);
        assert_eq!(config.recurrence.min_occurrences, 2);
        assert_eq!(config.recurrence.save_threshold, 50);
        assert!(config.emergency_fund().unwrap().is_zero());
    }

    #[test]
    fn parses_sections_and_keeps_partial_defaults() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.currency, Currency::Eur);
        assert_eq!(config.duplicates.date_window_days, 3);
        assert!(config.duplicates.normalize_counterparty);
        assert_eq!(config.recurrence.min_occurrences, 3);
        assert_eq!(config.recurrence.amount_tolerance, 0.05);
        assert_eq!(
            config.emergency_fund().unwrap(),
            Money::from_minor(150_000, Currency::Eur)
        );
    }

    #[test]
    fn builds_recurring_patterns() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let patterns = config.recurring_patterns().unwrap();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].amount, Money::from_minor(-1799, Currency::Eur));
        assert_eq!(patterns[0].frequency, Frequency::Monthly);
        assert_eq!(patterns[0].category, Some(Category::Subscriptions));
        assert!(patterns[0].active);
        assert!(!patterns[1].active);
    }

    #[test]
    fn builds_credits_with_original_amount_fallback() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let credits = config.credits().unwrap();
        assert_eq!(credits.len(), 1);
        let visa = &credits[0];
        assert_eq!(visa.credit_type, CreditType::CreditCard);
        assert_eq!(visa.current_balance.amount_minor, 320_000);
        assert_eq!(visa.original_amount, visa.current_balance);
        assert_eq!(visa.minimum_payment.amount_minor, 9_500);
        assert_eq!(visa.due_day, 15);
    }

    #[test]
    fn rejects_unknown_frequency() {
        let bad = r#"
[[recurring]]
counterparty = "Gym"
amount = "-30"
frequency = "daily"
"#;
        assert!(matches!(Config::from_toml(bad), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cashwise.toml");
        assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());

        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = Config::load_or_default(&path).unwrap();
        assert_eq!(config.recurring.len(), 2);
        assert!(matches!(
            Config::load(&dir.path().join("nope.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
