//! Monthly budget views: what actually happened this month, what the
//! configured recurring items say should happen, and a short projection of
//! the months ahead.

use std::collections::BTreeMap;

use cashwise_core::{
    add_months, first_of_month, month_range, BudgetProjection, Category, CategoryBreakdown, Credit,
    Currency, FixedItem, Money, MonthlyBudget, RecurringPattern, Transaction,
};
use chrono::NaiveDate;

use crate::{add_or_unchanged, sub_or_unchanged};

/// Number of months projected after the current one.
pub const PROJECTION_HORIZON_MONTHS: u32 = 3;

#[derive(Debug, Clone, Default)]
pub struct BudgetProjector {
    currency: Currency,
}

/// Fixed items split by sign of their monthly cost, with running totals.
struct FixedView {
    income_items: Vec<FixedItem>,
    expense_items: Vec<FixedItem>,
    income_total: Money,
    expense_total: Money,
}

/// Per-category sums in a single currency. Amounts in any other currency
/// are left out of both the sum and the count.
struct CategoryTotals {
    currency: Currency,
    totals: BTreeMap<Category, (Money, usize)>,
}

impl CategoryTotals {
    fn new(currency: Currency) -> Self {
        Self {
            currency,
            totals: BTreeMap::new(),
        }
    }

    fn add(&mut self, category: Category, amount: Money) {
        if amount.currency != self.currency {
            tracing::warn!(%category, %amount, "skipping amount in another currency");
            return;
        }
        let entry = self
            .totals
            .entry(category)
            .or_insert((Money::zero(self.currency), 0));
        entry.0 = add_or_unchanged(entry.0, amount);
        entry.1 += 1;
    }

    fn total(&self) -> Money {
        self.totals
            .values()
            .fold(Money::zero(self.currency), |sum, (amount, _)| add_or_unchanged(sum, *amount))
    }

    /// Largest amount first; equal amounts keep category order.
    fn into_breakdown(self) -> Vec<CategoryBreakdown> {
        let mut breakdown: Vec<CategoryBreakdown> = self
            .totals
            .into_iter()
            .map(|(category, (amount, count))| CategoryBreakdown {
                category,
                amount,
                count,
            })
            .collect();
        breakdown.sort_by(|a, b| b.amount.amount_minor.cmp(&a.amount.amount_minor));
        breakdown
    }
}

impl BudgetProjector {
    pub fn new(currency: Currency) -> Self {
        Self { currency }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Budget for the calendar month containing `today`.
    ///
    /// Income and expense breakdowns come from that month's transactions.
    /// Cash flow and savings come from active patterns and credit minimums
    /// only, so a half-finished month does not distort them.
    pub fn calculate_current_month(
        &self,
        transactions: &[Transaction],
        patterns: &[RecurringPattern],
        credits: &[Credit],
        today: NaiveDate,
    ) -> MonthlyBudget {
        let range = month_range(today);
        let mut income = CategoryTotals::new(self.currency);
        let mut expenses = CategoryTotals::new(self.currency);

        for tx in transactions.iter().filter(|t| range.contains(t.date)) {
            if tx.amount.is_positive() {
                income.add(tx.category, tx.amount);
            } else if tx.amount.is_negative() {
                expenses.add(tx.category, tx.amount.abs());
            }
        }

        let actual_income = income.total();
        let actual_expenses = expenses.total();
        let fixed = self.fixed_view(patterns);
        let budget = self.assemble(
            range.start,
            actual_income,
            actual_expenses,
            income.into_breakdown(),
            expenses.into_breakdown(),
            fixed,
            credits,
        );
        tracing::debug!(
            month = %budget.month,
            income = %budget.actual_income,
            expenses = %budget.actual_expenses,
            available = %budget.available_for_savings,
            "current month calculated"
        );
        budget
    }

    /// The `count` months following the month of `start_month`, built from
    /// active patterns alone. Debt minimums repeat unchanged every month;
    /// balances are not amortized forward.
    pub fn project_future_months(
        &self,
        patterns: &[RecurringPattern],
        credits: &[Credit],
        start_month: NaiveDate,
        count: u32,
    ) -> Vec<MonthlyBudget> {
        let base = first_of_month(start_month);
        (1..=count)
            .map(|offset| {
                let fixed = self.fixed_view(patterns);
                let mut income = CategoryTotals::new(self.currency);
                let mut expenses = CategoryTotals::new(self.currency);
                for item in &fixed.income_items {
                    income.add(item.category.unwrap_or_default(), item.amount);
                }
                for item in &fixed.expense_items {
                    expenses.add(item.category.unwrap_or_default(), item.amount);
                }
                self.assemble(
                    add_months(base, offset),
                    fixed.income_total,
                    fixed.expense_total,
                    income.into_breakdown(),
                    expenses.into_breakdown(),
                    fixed,
                    credits,
                )
            })
            .collect()
    }

    pub fn get_budget_projection(
        &self,
        transactions: &[Transaction],
        patterns: &[RecurringPattern],
        credits: &[Credit],
        today: NaiveDate,
    ) -> BudgetProjection {
        BudgetProjection {
            current_month: self.calculate_current_month(transactions, patterns, credits, today),
            future_months: self.project_future_months(
                patterns,
                credits,
                today,
                PROJECTION_HORIZON_MONTHS,
            ),
        }
    }

    fn fixed_view(&self, patterns: &[RecurringPattern]) -> FixedView {
        let mut view = FixedView {
            income_items: Vec::new(),
            expense_items: Vec::new(),
            income_total: Money::zero(self.currency),
            expense_total: Money::zero(self.currency),
        };

        for pattern in patterns.iter().filter(|p| p.active) {
            let cost = pattern.monthly_cost();
            if cost.is_zero() {
                continue;
            }
            let (items, total) = if cost.is_positive() {
                (&mut view.income_items, &mut view.income_total)
            } else {
                (&mut view.expense_items, &mut view.expense_total)
            };
            match total.checked_add(cost.abs()) {
                Ok(sum) => *total = sum,
                Err(err) => {
                    tracing::warn!(
                        counterparty = %pattern.counterparty,
                        %err,
                        "skipping recurring item"
                    );
                    continue;
                }
            }
            items.push(FixedItem {
                name: pattern.counterparty.clone(),
                amount: cost.abs(),
                frequency: pattern.frequency,
                category: pattern.category,
            });
        }
        view
    }

    fn total_debt_payments(&self, credits: &[Credit]) -> Money {
        credits.iter().fold(Money::zero(self.currency), |sum, credit| {
            add_or_unchanged(sum, credit.minimum_payment)
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        month: NaiveDate,
        actual_income: Money,
        actual_expenses: Money,
        income_by_category: Vec<CategoryBreakdown>,
        expenses_by_category: Vec<CategoryBreakdown>,
        fixed: FixedView,
        credits: &[Credit],
    ) -> MonthlyBudget {
        let total_debt_payments = self.total_debt_payments(credits);
        let net_cash_flow = sub_or_unchanged(fixed.income_total, fixed.expense_total);
        let available_for_savings = sub_or_unchanged(net_cash_flow, total_debt_payments);
        MonthlyBudget {
            month,
            actual_income,
            actual_expenses,
            fixed_income: fixed.income_total,
            fixed_expenses: fixed.expense_total,
            total_debt_payments,
            net_cash_flow,
            available_for_savings,
            income_by_category,
            expenses_by_category,
            fixed_income_items: fixed.income_items,
            fixed_expense_items: fixed.expense_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashwise_core::{AccountId, CreditType, Frequency, TransactionId};

    fn usd(minor: i64) -> Money {
        Money::from_minor(minor, Currency::Usd)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(id: i64, day: NaiveDate, amount: i64, category: Category) -> Transaction {
        Transaction::new(TransactionId(id), AccountId(1), day, usd(amount), "posted")
            .with_category(category)
    }

    fn pattern(
        name: &str,
        amount: i64,
        frequency: Frequency,
        category: Category,
    ) -> RecurringPattern {
        let mut p = RecurringPattern::new(name, usd(amount), frequency);
        p.category = Some(category);
        p
    }

    fn patterns() -> Vec<RecurringPattern> {
        vec![
            pattern("Employer", 500_000, Frequency::Monthly, Category::Salary),
            pattern("Landlord", -180_000, Frequency::Monthly, Category::Housing),
            pattern("Insurer", -120_000, Frequency::Annual, Category::Insurance),
        ]
    }

    fn credits() -> Vec<Credit> {
        vec![
            Credit::new("Visa", CreditType::CreditCard, usd(300_000), 0.2, usd(9_000)),
            Credit::new("Car", CreditType::AutoLoan, usd(1_200_000), 0.06, usd(30_000)),
        ]
    }

    #[test]
    fn current_month_actual_view_uses_only_this_month() {
        let today = date(2024, 3, 15);
        let txs = vec![
            tx(1, date(2024, 3, 1), 500_000, Category::Salary),
            tx(2, date(2024, 3, 2), -180_000, Category::Housing),
            tx(3, date(2024, 3, 5), -4_500, Category::Groceries),
            tx(4, date(2024, 3, 9), -5_500, Category::Groceries),
            tx(5, date(2024, 2, 28), -99_999, Category::Shopping),
            tx(6, date(2024, 4, 1), -99_999, Category::Shopping),
            tx(7, date(2024, 3, 31), 0, Category::Other),
        ];
        let budget = BudgetProjector::default().calculate_current_month(&txs, &[], &[], today);

        assert_eq!(budget.month, date(2024, 3, 1));
        assert_eq!(budget.actual_income, usd(500_000));
        assert_eq!(budget.actual_expenses, usd(190_000));
        assert_eq!(budget.expenses_by_category.len(), 2);
        assert_eq!(budget.expenses_by_category[0].category, Category::Housing);
        assert_eq!(budget.expenses_by_category[1].category, Category::Groceries);
        assert_eq!(budget.expenses_by_category[1].amount, usd(10_000));
        assert_eq!(budget.expenses_by_category[1].count, 2);
    }

    #[test]
    fn actual_view_leaves_out_other_currencies() {
        let today = date(2024, 3, 15);
        let euros = Transaction::new(
            TransactionId(1),
            AccountId(1),
            date(2024, 3, 2),
            Money::from_minor(-1_000, Currency::Eur),
            "Lidl Berlin",
        )
        .with_category(Category::Groceries);
        let txs = vec![euros, tx(2, date(2024, 3, 3), -500, Category::Groceries)];
        let projector = BudgetProjector::new(Currency::Usd);
        let budget = projector.calculate_current_month(&txs, &[], &[], today);

        assert_eq!(budget.actual_expenses, usd(500));
        assert_eq!(budget.expenses_by_category.len(), 1);
        assert_eq!(budget.expenses_by_category[0].amount, usd(500));
        assert_eq!(budget.expenses_by_category[0].count, 1);
    }

    #[test]
    fn foreign_only_category_is_not_listed() {
        let today = date(2024, 3, 15);
        let txs = vec![Transaction::new(
            TransactionId(1),
            AccountId(1),
            date(2024, 3, 2),
            Money::from_minor(-1_000, Currency::Eur),
            "Lidl Berlin",
        )
        .with_category(Category::Groceries)];
        let projector = BudgetProjector::new(Currency::Usd);
        let budget = projector.calculate_current_month(&txs, &[], &[], today);

        assert!(budget.actual_expenses.is_zero());
        assert!(budget.expenses_by_category.is_empty());
    }

    #[test]
    fn cash_flow_comes_from_fixed_view_not_actuals() {
        let today = date(2024, 3, 15);
        let txs = vec![tx(1, date(2024, 3, 3), 1_000_000, Category::Salary)];
        let projector = BudgetProjector::default();
        let budget = projector.calculate_current_month(&txs, &patterns(), &credits(), today);

        assert_eq!(budget.fixed_income, usd(500_000));
        assert_eq!(budget.fixed_expenses, usd(190_000));
        assert_eq!(budget.total_debt_payments, usd(39_000));
        assert_eq!(budget.net_cash_flow, usd(310_000));
        assert_eq!(budget.available_for_savings, usd(271_000));
        assert_eq!(budget.fixed_income_items.len(), 1);
        assert_eq!(budget.fixed_expense_items.len(), 2);
        assert_eq!(budget.fixed_expense_items[1].amount, usd(10_000));
    }

    #[test]
    fn inactive_and_unscheduled_patterns_are_ignored() {
        let mut list = patterns();
        list[1].active = false;
        list.push(pattern("Mystery", -5_000, Frequency::None, Category::Other));
        let budget = BudgetProjector::default().calculate_current_month(
            &[],
            &list,
            &[],
            date(2024, 3, 15),
        );
        assert_eq!(budget.fixed_expenses, usd(10_000));
        assert_eq!(budget.fixed_expense_items.len(), 1);
    }

    #[test]
    fn foreign_currency_pattern_is_skipped() {
        let mut list = patterns();
        list.push(RecurringPattern::new(
            "Swiss gym",
            Money::from_minor(-8_000, Currency::Chf),
            Frequency::Monthly,
        ));
        let budget =
            BudgetProjector::default().calculate_current_month(&[], &list, &[], date(2024, 3, 15));
        assert_eq!(budget.fixed_expenses, usd(190_000));
        assert_eq!(budget.fixed_expense_items.len(), 2);
    }

    #[test]
    fn future_months_repeat_fixed_view_and_debt() {
        let months = BudgetProjector::default().project_future_months(
            &patterns(),
            &credits(),
            date(2024, 11, 20),
            3,
        );
        assert_eq!(months.len(), 3);
        let starts: Vec<_> = months.iter().map(|m| m.month).collect();
        assert_eq!(starts, vec![date(2024, 12, 1), date(2025, 1, 1), date(2025, 2, 1)]);
        for month in &months {
            assert_eq!(month.actual_income, usd(500_000));
            assert_eq!(month.actual_expenses, usd(190_000));
            assert_eq!(month.total_debt_payments, usd(39_000));
            assert_eq!(month.available_for_savings, usd(271_000));
            assert_eq!(month.income_by_category[0].category, Category::Salary);
            assert_eq!(month.expenses_by_category[0].category, Category::Housing);
        }
    }

    #[test]
    fn projection_always_has_three_future_months() {
        let txs = vec![tx(1, date(2024, 1, 31), -100, Category::Dining)];
        let projection =
            BudgetProjector::default().get_budget_projection(&txs, &[], &[], date(2024, 1, 31));
        assert_eq!(projection.future_months.len(), PROJECTION_HORIZON_MONTHS as usize);
        assert_eq!(projection.current_month.month, date(2024, 1, 1));
        assert_eq!(projection.future_months[0].month, date(2024, 2, 1));
        assert!(projection.future_months[0].available_for_savings.is_zero());
    }
}
