use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::{Money, MoneyError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditType {
    CreditCard,
    PersonalLoan,
    StudentLoan,
    AutoLoan,
    Mortgage,
    LineOfCredit,
    #[default]
    Other,
}

impl fmt::Display for CreditType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditType::CreditCard => write!(f, "credit_card"),
            CreditType::PersonalLoan => write!(f, "personal_loan"),
            CreditType::StudentLoan => write!(f, "student_loan"),
            CreditType::AutoLoan => write!(f, "auto_loan"),
            CreditType::Mortgage => write!(f, "mortgage"),
            CreditType::LineOfCredit => write!(f, "line_of_credit"),
            CreditType::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for CreditType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "credit_card" => Ok(CreditType::CreditCard),
            "personal_loan" => Ok(CreditType::PersonalLoan),
            "student_loan" => Ok(CreditType::StudentLoan),
            "auto_loan" => Ok(CreditType::AutoLoan),
            "mortgage" => Ok(CreditType::Mortgage),
            "line_of_credit" => Ok(CreditType::LineOfCredit),
            "other" => Ok(CreditType::Other),
            other => Err(format!("Unknown credit type: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    pub id: Option<i64>,
    pub name: String,
    pub credit_type: CreditType,
    pub original_amount: Money,
    pub current_balance: Money,
    /// Annual rate as a fraction (0.1999 = 19.99%).
    pub annual_interest_rate: f64,
    pub minimum_payment: Money,
    pub lender: Option<String>,
    /// Day of month the payment is due (1-31).
    pub due_day: u8,
}

impl Credit {
    pub fn new(
        name: &str,
        credit_type: CreditType,
        balance: Money,
        annual_interest_rate: f64,
        minimum_payment: Money,
    ) -> Self {
        Credit {
            id: None,
            name: name.to_string(),
            credit_type,
            original_amount: balance,
            current_balance: balance,
            annual_interest_rate,
            minimum_payment,
            lender: None,
            due_day: 1,
        }
    }

    /// Reduces the balance by `payment`. The balance is not floored at zero,
    /// so overpayment leaves a negative (credit) balance. On a currency
    /// mismatch the balance is left unchanged.
    pub fn record_payment(&mut self, payment: Money) -> Result<(), MoneyError> {
        self.current_balance = self.current_balance.checked_sub(payment)?;
        Ok(())
    }

    /// Interest accrued over one month on the current balance, truncated.
    pub fn monthly_interest(&self) -> Money {
        let minor = self.current_balance.amount_minor as f64 * self.annual_interest_rate / 12.0;
        Money::from_minor(minor.trunc() as i64, self.current_balance.currency)
    }

    pub fn is_paid_off(&self) -> bool {
        self.current_balance.amount_minor <= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn usd(minor: i64) -> Money {
        Money::from_minor(minor, Currency::Usd)
    }

    fn card() -> Credit {
        Credit::new("Visa", CreditType::CreditCard, usd(100_000), 0.24, usd(2_500))
    }

    #[test]
    fn record_payment_reduces_balance() {
        let mut credit = card();
        credit.record_payment(usd(40_000)).unwrap();
        assert_eq!(credit.current_balance, usd(60_000));
        assert_eq!(credit.original_amount, usd(100_000));
    }

    #[test]
    fn record_payment_allows_negative_balance() {
        let mut credit = card();
        credit.record_payment(usd(150_000)).unwrap();
        assert_eq!(credit.current_balance, usd(-50_000));
        assert!(credit.is_paid_off());
    }

    #[test]
    fn record_payment_mismatch_leaves_balance() {
        let mut credit = card();
        let result = credit.record_payment(Money::from_minor(1_000, Currency::Eur));
        assert!(result.is_err());
        assert_eq!(credit.current_balance, usd(100_000));
    }

    #[test]
    fn monthly_interest_truncates() {
        // 100000 * 0.24 / 12 = 2000
        assert_eq!(card().monthly_interest(), usd(2_000));
        let odd = Credit::new("Loan", CreditType::PersonalLoan, usd(1_001), 0.05, usd(100));
        assert_eq!(odd.monthly_interest(), usd(4));
    }

    #[test]
    fn credit_type_from_str() {
        use std::str::FromStr;
        assert_eq!(CreditType::from_str("Credit Card").unwrap(), CreditType::CreditCard);
        assert_eq!(CreditType::from_str("line-of-credit").unwrap(), CreditType::LineOfCredit);
        assert!(CreditType::from_str("payday").is_err());
    }
}
