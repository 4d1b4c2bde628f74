use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spending/income category. Declaration order is significant: it is the
/// ordinal used wherever ties between categories are broken.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Uncategorized,
    Salary,
    Housing,
    Utilities,
    Groceries,
    Dining,
    Transportation,
    Insurance,
    Healthcare,
    Subscriptions,
    Entertainment,
    Shopping,
    Education,
    DebtPayment,
    Savings,
    Investment,
    Fees,
    Transfer,
    Other,
}

impl Category {
    pub const ALL: [Category; 19] = [
        Category::Uncategorized,
        Category::Salary,
        Category::Housing,
        Category::Utilities,
        Category::Groceries,
        Category::Dining,
        Category::Transportation,
        Category::Insurance,
        Category::Healthcare,
        Category::Subscriptions,
        Category::Entertainment,
        Category::Shopping,
        Category::Education,
        Category::DebtPayment,
        Category::Savings,
        Category::Investment,
        Category::Fees,
        Category::Transfer,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Uncategorized => "uncategorized",
            Category::Salary => "salary",
            Category::Housing => "housing",
            Category::Utilities => "utilities",
            Category::Groceries => "groceries",
            Category::Dining => "dining",
            Category::Transportation => "transportation",
            Category::Insurance => "insurance",
            Category::Healthcare => "healthcare",
            Category::Subscriptions => "subscriptions",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Education => "education",
            Category::DebtPayment => "debt_payment",
            Category::Savings => "savings",
            Category::Investment => "investment",
            Category::Fees => "fees",
            Category::Transfer => "transfer",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace([' ', '-'], "_");
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Unknown category: '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_from_str_roundtrip() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn from_str_accepts_loose_spelling() {
        assert_eq!("Debt Payment".parse::<Category>().unwrap(), Category::DebtPayment);
        assert_eq!("debt-payment".parse::<Category>().unwrap(), Category::DebtPayment);
        assert!("lottery".parse::<Category>().is_err());
    }

    #[test]
    fn ordinal_order_starts_with_uncategorized() {
        assert!(Category::Uncategorized < Category::Salary);
        assert!(Category::Groceries < Category::Other);
        assert_eq!(Category::default(), Category::Uncategorized);
    }
}
