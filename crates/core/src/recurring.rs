use serde::{Deserialize, Serialize};
use std::fmt;

use super::category::Category;
use super::money::Money;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    None,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Annual,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::None => write!(f, "none"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Biweekly => write!(f, "biweekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Quarterly => write!(f, "quarterly"),
            Frequency::Annual => write!(f, "annual"),
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Frequency::None),
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" => Ok(Frequency::Biweekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "annual" | "yearly" => Ok(Frequency::Annual),
            other => Err(format!("Unknown frequency: '{other}'")),
        }
    }
}

/// A cash flow expected to repeat, either configured by the user or
/// accepted from detection. `amount` is signed like a transaction amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringPattern {
    pub id: Option<i64>,
    pub counterparty: String,
    pub amount: Money,
    pub frequency: Frequency,
    pub category: Option<Category>,
    pub active: bool,
}

impl RecurringPattern {
    pub fn new(counterparty: &str, amount: Money, frequency: Frequency) -> Self {
        RecurringPattern {
            id: None,
            counterparty: counterparty.to_string(),
            amount,
            frequency,
            category: None,
            active: true,
        }
    }

    /// Average cost per month, truncated toward zero.
    pub fn monthly_cost(&self) -> Money {
        match self.frequency {
            Frequency::Weekly => self.amount.scale(52, 12),
            Frequency::Biweekly => self.amount.scale(26, 12),
            Frequency::Monthly => self.amount,
            Frequency::Quarterly => self.amount.scale(1, 3),
            Frequency::Annual => self.amount.scale(1, 12),
            Frequency::None => Money::zero(self.amount.currency),
        }
    }
}
