//! Text and JSON rendering of command results.

use anyhow::Result;
use cashwise_analysis::{DetectedPattern, DuplicateCandidate};
use cashwise_core::{
    BudgetProjection, CategoryBreakdown, Credit, FinancialRecommendation, Money, MonthlyBudget,
    RecurringPattern,
};
use serde::Serialize;

use crate::paths::CashwisePaths;

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub parsed: usize,
    pub categorized: usize,
    pub skipped_duplicates: usize,
    pub inserted: u64,
}

#[derive(Debug, Serialize)]
pub struct DetectReport {
    pub patterns: Vec<DetectedPattern>,
    pub save_threshold: u8,
    pub saved: usize,
}

#[derive(Debug, Serialize)]
pub struct PatternRow {
    #[serde(flatten)]
    pub pattern: RecurringPattern,
    pub monthly_cost: Money,
}

#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub credit_id: i64,
    pub name: String,
    pub payment: Money,
    pub previous_balance: Money,
    pub new_balance: Money,
}

/// Prints `value` as pretty JSON when `json` is set, otherwise hands it to
/// the text renderer.
pub fn emit<T: Serialize + ?Sized>(json: bool, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

pub fn print_paths(paths: &CashwisePaths, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({
            "config_file": paths.config_file,
            "db_file": paths.db_file,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Config file: {}", paths.config_file.display());
        println!("Database:    {}", paths.db_file.display());
    }
    Ok(())
}

pub fn print_import(summary: &ImportSummary) {
    println!("Parsed:      {}", summary.parsed);
    println!("Categorized: {}", summary.categorized);
    println!("Duplicates:  {} skipped", summary.skipped_duplicates);
    println!("Imported:    {}", summary.inserted);
}

pub fn print_duplicates(candidates: &[DuplicateCandidate]) {
    if candidates.is_empty() {
        println!("No duplicates found.");
        return;
    }
    for c in candidates {
        println!(
            "{:>4.0}%  #{} {} {:>12} {}  <->  #{} {} {:>12} {}  ({})",
            c.confidence * 100.0,
            c.first.id,
            c.first.date,
            c.first.amount.to_string(),
            c.first.counterparty_name().unwrap_or(&c.first.description),
            c.second.id,
            c.second.date,
            c.second.amount.to_string(),
            c.second.counterparty_name().unwrap_or(&c.second.description),
            c.reason,
        );
    }
}

pub fn print_detect(report: &DetectReport) {
    if report.patterns.is_empty() {
        println!("No recurring patterns detected.");
        return;
    }
    println!(
        "{:<28} {:>12} {:<10} {:<15} {:>5} {:>4}",
        "Counterparty", "Amount", "Frequency", "Category", "Seen", "Conf"
    );
    for p in &report.patterns {
        let marker = if p.confidence >= report.save_threshold { "" } else { " (low)" };
        println!(
            "{:<28} {:>12} {:<10} {:<15} {:>5} {:>4}{}",
            truncate(&p.counterparty, 28),
            p.average_amount.to_string(),
            p.frequency.to_string(),
            p.category.map(|c| c.to_string()).unwrap_or_default(),
            p.occurrence_dates.len(),
            p.confidence,
            marker,
        );
    }
    if report.saved > 0 {
        println!();
        println!("Saved {} new pattern(s).", report.saved);
    }
}

pub fn print_patterns(rows: &[PatternRow]) {
    if rows.is_empty() {
        println!("No recurring patterns. Run `cashwise detect --save` to store detected ones.");
        return;
    }
    println!(
        "{:>5} {:<28} {:>12} {:<10} {:>12}",
        "ID", "Counterparty", "Amount", "Frequency", "Per month"
    );
    for row in rows {
        let p = &row.pattern;
        println!(
            "{:>5} {:<28} {:>12} {:<10} {:>12}",
            p.id.map(|id| id.to_string()).unwrap_or_else(|| "cfg".to_string()),
            truncate(&p.counterparty, 28),
            p.amount.to_string(),
            p.frequency.to_string(),
            row.monthly_cost.to_string(),
        );
    }
}

pub fn print_projection(projection: &BudgetProjection) {
    let current = &projection.current_month;
    println!("Budget for {}", current.month.format("%B %Y"));
    println!("─────────────────────────────────────");
    println!("Actual income:    {:>14}", current.actual_income.to_string());
    println!("Actual expenses:  {:>14}", current.actual_expenses.to_string());
    print_breakdown("Expenses by category", &current.expenses_by_category);
    println!();
    print_fixed(current);

    println!();
    println!("Next months");
    for month in &projection.future_months {
        println!(
            "  {:<10} income {:>12}  expenses {:>12}  debt {:>12}  available {:>12}",
            month.month.format("%b %Y").to_string(),
            month.fixed_income.to_string(),
            month.fixed_expenses.to_string(),
            month.total_debt_payments.to_string(),
            month.available_for_savings.to_string(),
        );
    }
}

fn print_breakdown(title: &str, rows: &[CategoryBreakdown]) {
    if rows.is_empty() {
        return;
    }
    println!("{title}:");
    for row in rows {
        println!(
            "  {:<18} {:>12} ({})",
            row.category.to_string(),
            row.amount.to_string(),
            row.count
        );
    }
}

fn print_fixed(budget: &MonthlyBudget) {
    println!("Fixed income:     {:>14}", budget.fixed_income.to_string());
    println!("Fixed expenses:   {:>14}", budget.fixed_expenses.to_string());
    println!("Debt minimums:    {:>14}", budget.total_debt_payments.to_string());
    println!("Net cash flow:    {:>14}", budget.net_cash_flow.to_string());
    println!("Available:        {:>14}", budget.available_for_savings.to_string());
}

pub fn print_recommendation(rec: &FinancialRecommendation) {
    println!("Monthly available:   {:>14}", rec.monthly_available.to_string());
    println!(
        "Emergency fund:      {:>14} of {} ({})",
        rec.current_emergency_fund.to_string(),
        rec.emergency_fund_target,
        if rec.emergency_fund_complete { "complete" } else { "building" }
    );
    println!("Save:                {:>14}", rec.recommended_savings.to_string());
    println!("Extra debt payment:  {:>14}", rec.recommended_extra_debt.to_string());
    println!("Invest:              {:>14}", rec.recommended_investment.to_string());

    if rec.debt_plans.is_empty() {
        return;
    }
    println!();
    println!(
        "{:<20} {:>12} {:>7} {:>10} {:>10} {:>7}  Payoff",
        "Credit", "Balance", "Rate", "Minimum", "Pay", "Months"
    );
    for plan in &rec.debt_plans {
        let (months, payoff) = if plan.pays_off() {
            (plan.months_to_payoff.to_string(), plan.payoff_date.format("%b %Y").to_string())
        } else {
            ("never".to_string(), "payment below interest".to_string())
        };
        println!(
            "{:<20} {:>12} {:>6.2}% {:>10} {:>10} {:>7}  {}",
            truncate(&plan.credit_name, 20),
            plan.current_balance.to_string(),
            plan.annual_interest_rate * 100.0,
            plan.minimum_payment.to_string(),
            plan.recommended_payment.to_string(),
            months,
            payoff,
        );
    }
    println!();
    println!("Debt free by {}", rec.debt_free_date.format("%B %Y"));
}

pub fn print_credits(credits: &[Credit]) {
    if credits.is_empty() {
        println!("No credits. Add one with `cashwise credit add`.");
        return;
    }
    println!(
        "{:>5} {:<20} {:<14} {:>12} {:>7} {:>10} {:>10} {:>4}",
        "ID", "Name", "Type", "Balance", "Rate", "Interest", "Minimum", "Due"
    );
    for c in credits {
        println!(
            "{:>5} {:<20} {:<14} {:>12} {:>6.2}% {:>10} {:>10} {:>4}",
            c.id.map(|id| id.to_string()).unwrap_or_else(|| "cfg".to_string()),
            truncate(&c.name, 20),
            c.credit_type.to_string(),
            c.current_balance.to_string(),
            c.annual_interest_rate * 100.0,
            c.monthly_interest().to_string(),
            c.minimum_payment.to_string(),
            c.due_day,
        );
    }
}

pub fn print_payment(receipt: &PaymentReceipt) {
    println!(
        "Paid {} towards {} (#{}): {} -> {}",
        receipt.payment,
        receipt.name,
        receipt.credit_id,
        receipt.previous_balance,
        receipt.new_balance
    );
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Netflix", 10), "Netflix");
        assert_eq!(truncate("Stadtwerke München", 10), "Stadtwerk…");
        assert_eq!(truncate("Stadtwerke München", 10).chars().count(), 10);
    }

    #[test]
    fn pattern_row_flattens_pattern_fields() {
        use cashwise_core::{Currency, Frequency};
        let pattern = RecurringPattern::new(
            "Insurer",
            Money::from_minor(-120_000, Currency::Usd),
            Frequency::Annual,
        );
        let row = PatternRow {
            monthly_cost: pattern.monthly_cost(),
            pattern,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["counterparty"], "Insurer");
        assert_eq!(json["monthly_cost"]["amount_minor"], -10_000);
    }
}
