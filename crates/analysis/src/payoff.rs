//! Debt payoff planning with the avalanche method: every spare cent goes to
//! the highest-rate credit while the rest receive their minimums.

use std::cmp::Ordering;

use cashwise_core::{
    add_months, Credit, DebtPayoffPlan, FinancialRecommendation, Money, MonthlyBudget,
    NEVER_PAYS_OFF,
};
use chrono::NaiveDate;

use crate::add_or_unchanged;

/// Months of fixed expenses the emergency fund should cover.
const EMERGENCY_FUND_MONTHS: i64 = 3;

/// Months needed to clear `balance` paying `monthly_payment` at `annual_rate`.
///
/// Returns 0 when there is nothing to pay or nothing being paid, and
/// [`NEVER_PAYS_OFF`] when the payment does not exceed the first month's
/// interest.
pub fn calculate_months_to_payoff(
    balance: Money,
    monthly_payment: Money,
    annual_rate: f64,
) -> u32 {
    let balance = balance.amount_minor;
    let payment = monthly_payment.amount_minor;
    if payment <= 0 || balance <= 0 {
        return 0;
    }

    if annual_rate <= 0.0 {
        let months = (balance + payment - 1) / payment;
        return u32::try_from(months).unwrap_or(u32::MAX);
    }

    let rate = annual_rate / 12.0;
    let (balance, payment) = (balance as f64, payment as f64);
    if payment <= balance * rate {
        return NEVER_PAYS_OFF;
    }

    let months = (-(1.0 - rate * balance / payment).ln() / (1.0 + rate).ln()).ceil();
    (months as u32).max(1)
}

pub fn calculate_payoff_date(today: NaiveDate, months: u32) -> NaiveDate {
    add_months(today, months)
}

/// Splits the month's spare money between savings, extra debt payments and
/// investment, and plans each credit's payoff.
///
/// Until the emergency fund reaches three months of fixed expenses, spare
/// money is halved between savings and debt. After that 70% goes to debt and
/// 30% to investment. Odd cents always land on debt.
pub fn calculate_recommendation(
    budget: &MonthlyBudget,
    credits: &[Credit],
    current_emergency_fund: Money,
    today: NaiveDate,
) -> FinancialRecommendation {
    let currency = budget.available_for_savings.currency;
    let monthly_available =
        add_or_unchanged(budget.available_for_savings, budget.total_debt_payments);
    let emergency_fund_target = budget.fixed_expenses.scale(EMERGENCY_FUND_MONTHS, 1);
    // A fund in another currency never counts as complete.
    let emergency_fund_complete = matches!(
        current_emergency_fund.partial_cmp(&emergency_fund_target),
        Some(Ordering::Greater | Ordering::Equal)
    );

    let spare = budget.available_for_savings.amount_minor.max(0);
    let (savings, extra_debt, investment) = if emergency_fund_complete {
        let investment = spare * 3 / 10;
        (0, spare - investment, investment)
    } else {
        let savings = spare / 2;
        (savings, spare - savings, 0)
    };
    let extra_debt = Money::from_minor(extra_debt, currency);

    let mut ordered: Vec<&Credit> = credits.iter().collect();
    ordered.sort_by(|a, b| b.annual_interest_rate.total_cmp(&a.annual_interest_rate));

    let debt_plans: Vec<DebtPayoffPlan> = ordered
        .into_iter()
        .enumerate()
        .map(|(rank, credit)| {
            let recommended_payment = if rank == 0 {
                add_or_unchanged(credit.minimum_payment, extra_debt)
            } else {
                credit.minimum_payment
            };
            let months_to_payoff = calculate_months_to_payoff(
                credit.current_balance,
                recommended_payment,
                credit.annual_interest_rate,
            );
            if months_to_payoff == NEVER_PAYS_OFF {
                tracing::debug!(credit = %credit.name, "payment does not cover interest");
            }
            DebtPayoffPlan {
                credit_id: credit.id,
                credit_name: credit.name.clone(),
                current_balance: credit.current_balance,
                annual_interest_rate: credit.annual_interest_rate,
                minimum_payment: credit.minimum_payment,
                recommended_payment,
                months_to_payoff,
                payoff_date: calculate_payoff_date(today, months_to_payoff),
            }
        })
        .collect();

    let debt_free_date = debt_plans
        .iter()
        .map(|plan| plan.payoff_date)
        .max()
        .unwrap_or(today);

    FinancialRecommendation {
        monthly_available,
        emergency_fund_target,
        current_emergency_fund,
        emergency_fund_complete,
        recommended_savings: Money::from_minor(savings, currency),
        recommended_extra_debt: extra_debt,
        recommended_investment: Money::from_minor(investment, currency),
        debt_plans,
        debt_free_date,
    }
}
