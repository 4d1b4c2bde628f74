use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context as _, Result};
use cashwise_analysis::{
    calculate_recommendation, counterparty_key, BudgetProjector, DetectedPattern,
    DuplicateDetector, RecurrenceDetector,
};
use cashwise_core::{
    month_range, AccountId, Config, Credit, CreditType, Frequency, IdSequence, Money,
    RecurringPattern,
};
use cashwise_import::import::import_csv_with_profile;
use cashwise_import::ImportConfig;
use cashwise_storage::DbPool;
use chrono::NaiveDate;
use clap::Subcommand;

use crate::output::{self, DetectReport, ImportSummary, PatternRow, PaymentReceipt};
use crate::paths::CashwisePaths;

const EMERGENCY_FUND_SETTING: &str = "emergency_fund";

/// Credit subcommands
#[derive(Subcommand)]
pub enum CreditCommands {
    /// Add a credit card or loan
    Add {
        /// Display name
        name: String,
        /// Outstanding balance (e.g. "3200.00")
        #[arg(short, long)]
        balance: String,
        /// Annual interest rate as a fraction (0.1999 = 19.99%)
        #[arg(short, long)]
        rate: f64,
        /// Minimum monthly payment
        #[arg(short, long)]
        minimum: String,
        /// credit_card, personal_loan, student_loan, auto_loan, mortgage,
        /// line_of_credit or other
        #[arg(short = 't', long = "type", default_value = "other")]
        credit_type: CreditType,
        #[arg(long)]
        lender: Option<String>,
        /// Day of month the payment is due
        #[arg(long, default_value = "1")]
        due_day: u8,
    },

    /// List stored and configured credits
    List,

    /// Record a payment against a stored credit
    Pay {
        /// Credit id as shown by `credit list`
        id: i64,
        /// Amount paid
        amount: String,
    },
}

/// Everything a command needs: configuration, import settings and the
/// database.
pub struct Context {
    pub config: Config,
    pub import: ImportConfig,
    pub db: DbPool,
    pub json: bool,
}

impl Context {
    pub async fn open(paths: &CashwisePaths, json: bool) -> Result<Self> {
        let config = Config::load_or_default(&paths.config_file)
            .with_context(|| format!("loading {}", paths.config_file.display()))?;
        let import = match std::fs::read_to_string(&paths.config_file) {
            Ok(text) => ImportConfig::from_toml(&text)
                .with_context(|| format!("parsing {}", paths.config_file.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %paths.config_file.display(),
                    "no config file, using defaults"
                );
                ImportConfig::default()
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", paths.config_file.display()))
            }
        };

        paths.ensure_db_dir()?;
        let db = cashwise_storage::create_db(&paths.db_file)
            .await
            .with_context(|| format!("opening database {}", paths.db_file.display()))?;

        Ok(Self {
            config,
            import,
            db,
            json,
        })
    }

    fn money(&self, text: &str) -> Result<Money> {
        Money::parse(text, self.config.currency).with_context(|| format!("invalid amount '{text}'"))
    }

    /// Active stored patterns followed by those declared in the config.
    async fn patterns(&self) -> Result<Vec<RecurringPattern>> {
        let mut patterns = cashwise_storage::get_recurring_patterns(&self.db, true).await?;
        patterns.extend(self.config.recurring_patterns()?);
        Ok(patterns)
    }

    /// Stored credits followed by those declared in the config.
    async fn credits(&self) -> Result<Vec<Credit>> {
        let mut credits = cashwise_storage::get_credits(&self.db).await?;
        credits.extend(self.config.credits()?);
        Ok(credits)
    }

    async fn emergency_fund(&self, override_text: Option<&str>) -> Result<Money> {
        if let Some(text) = override_text {
            let fund = self.money(text)?;
            cashwise_storage::set_setting(&self.db, EMERGENCY_FUND_SETTING, text.trim()).await?;
            return Ok(fund);
        }
        match cashwise_storage::get_setting(&self.db, EMERGENCY_FUND_SETTING).await? {
            Some(stored) => self.money(&stored),
            None => Ok(self.config.emergency_fund()?),
        }
    }
}

pub async fn import(ctx: &Context, file: &Path, profile_name: &str, account: i64) -> Result<()> {
    let Some(profile) = ctx.import.profile(profile_name) else {
        let known = ctx.import.profile_names();
        bail!(
            "unknown import profile '{profile_name}' (configured: {})",
            if known.is_empty() { "none".to_string() } else { known.join(", ") }
        );
    };

    let last_id = cashwise_storage::max_transaction_id(&ctx.db).await?;
    let mut ids = IdSequence::starting_after(last_id);
    let mut incoming = import_csv_with_profile(file, profile, AccountId(account), &mut ids)
        .with_context(|| format!("importing {}", file.display()))?;

    let mut engine = ctx.import.rule_engine().context("building categorization rules")?;
    let categorized = engine.categorize(&mut incoming);
    for (rule, hits) in engine.hit_counts() {
        tracing::debug!(rule, hits, "rule hits");
    }

    let detector = DuplicateDetector::new(ctx.config.duplicates.clone());
    let mut known = cashwise_storage::get_transactions(&ctx.db).await?;
    let parsed = incoming.len();
    let mut accepted = Vec::with_capacity(parsed);
    for tx in incoming {
        if let Some(hit) = detector.is_duplicate(&tx, &known) {
            tracing::info!(
                date = %tx.date,
                amount = %tx.amount,
                existing = %hit.second.id,
                confidence = hit.confidence,
                "skipping duplicate"
            );
            continue;
        }
        known.push(tx.clone());
        accepted.push(tx);
    }

    let inserted = cashwise_storage::insert_transactions(&ctx.db, &accepted).await?;
    tracing::info!(file = %file.display(), parsed, inserted, "import complete");

    let summary = ImportSummary {
        parsed,
        categorized,
        skipped_duplicates: parsed - accepted.len(),
        inserted,
    };
    output::emit(ctx.json, &summary, output::print_import)
}

pub async fn duplicates(ctx: &Context) -> Result<()> {
    let transactions = cashwise_storage::get_transactions(&ctx.db).await?;
    let candidates = DuplicateDetector::new(ctx.config.duplicates.clone())
        .find_duplicates(&transactions);
    output::emit(ctx.json, &candidates, |c| output::print_duplicates(c))
}

pub async fn detect(ctx: &Context, save: bool) -> Result<()> {
    let transactions = cashwise_storage::get_transactions(&ctx.db).await?;
    let settings = ctx.config.recurrence.clone();
    let threshold = settings.save_threshold;
    let detected = RecurrenceDetector::new(settings).detect(&transactions);

    let saved = if save {
        save_detected(&ctx.db, &detected, threshold).await?
    } else {
        0
    };

    let report = DetectReport {
        patterns: detected,
        save_threshold: threshold,
        saved,
    };
    output::emit(ctx.json, &report, output::print_detect)
}

/// Stores detections at or above `threshold`, skipping any whose
/// counterparty, frequency and amount match a stored pattern. One
/// counterparty may yield several patterns with different amounts.
async fn save_detected(
    db: &DbPool,
    detected: &[DetectedPattern],
    threshold: u8,
) -> Result<usize> {
    type PatternKey = (String, Frequency, Money);

    let mut existing: HashSet<PatternKey> = cashwise_storage::get_recurring_patterns(db, false)
        .await?
        .iter()
        .map(|p| (counterparty_key(&p.counterparty), p.frequency, p.amount))
        .collect();

    let mut saved = 0;
    for pattern in detected.iter().filter(|p| p.confidence >= threshold) {
        let key = (
            counterparty_key(&pattern.counterparty),
            pattern.frequency,
            pattern.average_amount,
        );
        if !existing.insert(key) {
            tracing::debug!(counterparty = %pattern.counterparty, "pattern already stored");
            continue;
        }
        let id = cashwise_storage::insert_recurring_pattern(db, &pattern.to_recurring_pattern())
            .await?;
        tracing::info!(
            id,
            counterparty = %pattern.counterparty,
            amount = %pattern.average_amount,
            "saved recurring pattern"
        );
        saved += 1;
    }
    Ok(saved)
}

pub async fn patterns(ctx: &Context, deactivate: Option<i64>) -> Result<()> {
    if let Some(id) = deactivate {
        if !cashwise_storage::deactivate_recurring_pattern(&ctx.db, id).await? {
            bail!("no stored recurring pattern with id {id}");
        }
        tracing::info!(id, "recurring pattern deactivated");
    }

    let rows: Vec<PatternRow> = ctx
        .patterns()
        .await?
        .into_iter()
        .map(|pattern| PatternRow {
            monthly_cost: pattern.monthly_cost(),
            pattern,
        })
        .collect();
    output::emit(ctx.json, &rows, |r| output::print_patterns(r))
}

pub async fn budget(ctx: &Context, today: NaiveDate) -> Result<()> {
    let transactions =
        cashwise_storage::get_transactions_in_range(&ctx.db, month_range(today)).await?;
    let projection = BudgetProjector::new(ctx.config.currency).get_budget_projection(
        &transactions,
        &ctx.patterns().await?,
        &ctx.credits().await?,
        today,
    );
    output::emit(ctx.json, &projection, output::print_projection)
}

pub async fn recommend(
    ctx: &Context,
    today: NaiveDate,
    emergency_fund: Option<&str>,
) -> Result<()> {
    let transactions =
        cashwise_storage::get_transactions_in_range(&ctx.db, month_range(today)).await?;
    let credits = ctx.credits().await?;
    let budget = BudgetProjector::new(ctx.config.currency).calculate_current_month(
        &transactions,
        &ctx.patterns().await?,
        &credits,
        today,
    );
    let fund = ctx.emergency_fund(emergency_fund).await?;
    let recommendation = calculate_recommendation(&budget, &credits, fund, today);
    output::emit(ctx.json, &recommendation, output::print_recommendation)
}

pub async fn credit(ctx: &Context, cmd: CreditCommands) -> Result<()> {
    match cmd {
        CreditCommands::Add {
            name,
            balance,
            rate,
            minimum,
            credit_type,
            lender,
            due_day,
        } => {
            if !(1..=31).contains(&due_day) {
                bail!("due day must be between 1 and 31, got {due_day}");
            }
            let mut credit =
                Credit::new(&name, credit_type, ctx.money(&balance)?, rate, ctx.money(&minimum)?);
            credit.lender = lender;
            credit.due_day = due_day;
            let id = cashwise_storage::insert_credit(&ctx.db, &credit).await?;
            credit.id = Some(id);
            tracing::info!(id, name = %credit.name, "credit added");
            output::emit(ctx.json, &credit, |c| output::print_credits(std::slice::from_ref(c)))
        }
        CreditCommands::List => {
            let credits = ctx.credits().await?;
            output::emit(ctx.json, &credits, |c| output::print_credits(c))
        }
        CreditCommands::Pay { id, amount } => {
            let payment = ctx.money(&amount)?;
            let mut credit = cashwise_storage::get_credits(&ctx.db)
                .await?
                .into_iter()
                .find(|c| c.id == Some(id))
                .with_context(|| format!("no stored credit with id {id}"))?;
            let previous = credit.current_balance;
            credit
                .record_payment(payment)
                .with_context(|| format!("paying {payment} towards '{}'", credit.name))?;
            cashwise_storage::update_credit_balance(&ctx.db, id, credit.current_balance).await?;
            tracing::info!(id, %payment, balance = %credit.current_balance, "payment recorded");
            if credit.is_paid_off() {
                tracing::info!(id, name = %credit.name, "credit paid off");
            }

            let receipt = PaymentReceipt {
                credit_id: id,
                name: credit.name,
                payment,
                previous_balance: previous,
                new_balance: credit.current_balance,
            };
            output::emit(ctx.json, &receipt, output::print_payment)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashwise_core::{Category, Currency};

    fn detected(counterparty: &str, amount: i64, confidence: u8) -> DetectedPattern {
        DetectedPattern {
            counterparty: counterparty.to_string(),
            average_amount: Money::from_minor(amount, Currency::Usd),
            frequency: Frequency::Monthly,
            category: Some(Category::Utilities),
            occurrence_dates: vec![
                NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            ],
            confidence,
        }
    }

    #[tokio::test]
    async fn saves_every_amount_cluster_of_one_counterparty() {
        let dir = tempfile::tempdir().unwrap();
        let db = cashwise_storage::create_db(&dir.path().join("cashwise.db"))
            .await
            .unwrap();
        let found = vec![
            detected("City Utilities", -1_000, 90),
            detected("CITY  utilities", -5_000, 85),
            detected("Gym", -2_999, 40),
        ];

        assert_eq!(save_detected(&db, &found, 50).await.unwrap(), 2);

        let stored = cashwise_storage::get_recurring_patterns(&db, false).await.unwrap();
        let mut amounts: Vec<i64> = stored.iter().map(|p| p.amount.amount_minor).collect();
        amounts.sort();
        assert_eq!(amounts, vec![-5_000, -1_000]);
    }

    #[tokio::test]
    async fn rerun_does_not_store_the_same_pattern_twice() {
        let dir = tempfile::tempdir().unwrap();
        let db = cashwise_storage::create_db(&dir.path().join("cashwise.db"))
            .await
            .unwrap();
        let found = vec![detected("City Utilities", -1_000, 90)];

        assert_eq!(save_detected(&db, &found, 50).await.unwrap(), 1);
        assert_eq!(save_detected(&db, &found, 50).await.unwrap(), 0);
        assert_eq!(cashwise_storage::get_recurring_patterns(&db, false).await.unwrap().len(), 1);
    }
}
