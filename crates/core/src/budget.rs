//! Output types produced by the budget projector and debt-payoff planner.
//!
//! Expense figures are positive magnitudes; income and expense totals are
//! therefore directly comparable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::money::Money;
use super::recurring::Frequency;

/// Months-to-payoff value meaning "the payment never covers the interest".
pub const NEVER_PAYS_OFF: u32 = 999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub amount: Money,
    pub count: usize,
}

/// A configured or accepted recurring item, expressed per month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedItem {
    pub name: String,
    pub amount: Money,
    pub frequency: Frequency,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBudget {
    /// First day of the month this budget covers.
    pub month: NaiveDate,
    pub actual_income: Money,
    pub actual_expenses: Money,
    pub fixed_income: Money,
    pub fixed_expenses: Money,
    pub total_debt_payments: Money,
    /// `fixed_income - fixed_expenses`.
    pub net_cash_flow: Money,
    /// `net_cash_flow - total_debt_payments`.
    pub available_for_savings: Money,
    pub income_by_category: Vec<CategoryBreakdown>,
    pub expenses_by_category: Vec<CategoryBreakdown>,
    pub fixed_income_items: Vec<FixedItem>,
    pub fixed_expense_items: Vec<FixedItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProjection {
    pub current_month: MonthlyBudget,
    pub future_months: Vec<MonthlyBudget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtPayoffPlan {
    pub credit_id: Option<i64>,
    pub credit_name: String,
    pub current_balance: Money,
    pub annual_interest_rate: f64,
    pub minimum_payment: Money,
    pub recommended_payment: Money,
    /// [`NEVER_PAYS_OFF`] when the payment does not cover accruing interest.
    pub months_to_payoff: u32,
    pub payoff_date: NaiveDate,
}

impl DebtPayoffPlan {
    pub fn pays_off(&self) -> bool {
        self.months_to_payoff != NEVER_PAYS_OFF
    }

    pub fn extra_payment(&self) -> Money {
        self.recommended_payment
            .checked_sub(self.minimum_payment)
            .unwrap_or(Money::zero(self.minimum_payment.currency))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecommendation {
    /// Discretionary money before minimum debt payments are set aside.
    pub monthly_available: Money,
    pub emergency_fund_target: Money,
    pub current_emergency_fund: Money,
    pub emergency_fund_complete: bool,
    pub recommended_savings: Money,
    pub recommended_extra_debt: Money,
    pub recommended_investment: Money,
    /// Ordered by interest rate, highest first.
    pub debt_plans: Vec<DebtPayoffPlan>,
    pub debt_free_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;

    fn plan(months: u32) -> DebtPayoffPlan {
        DebtPayoffPlan {
            credit_id: Some(1),
            credit_name: "Visa".to_string(),
            current_balance: Money::from_minor(100_000, Currency::Usd),
            annual_interest_rate: 0.2,
            minimum_payment: Money::from_minor(2_500, Currency::Usd),
            recommended_payment: Money::from_minor(4_000, Currency::Usd),
            months_to_payoff: months,
            payoff_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        }
    }

    #[test]
    fn pays_off_recognises_sentinel() {
        assert!(plan(12).pays_off());
        assert!(!plan(NEVER_PAYS_OFF).pays_off());
    }

    #[test]
    fn extra_payment_is_difference_over_minimum() {
        assert_eq!(plan(12).extra_payment().amount_minor, 1_500);
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_string(&plan(3)).unwrap();
        assert!(json.contains("\"months_to_payoff\":3"));
        assert!(json.contains("\"credit_name\":\"Visa\""));
    }
}
