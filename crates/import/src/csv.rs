use cashwise_core::{
    AccountId, Category, Currency, Money, Transaction, TransactionId, TransactionType,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

const FALLBACK_DATE_FORMATS: [&str; 6] = [
    "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y", "%Y-%m-%d",
];

/// Zero-based column indices for a bank's CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvColumnMapping {
    pub date_column: Option<usize>,
    pub description_column: Option<usize>,
    pub counterparty_column: Option<usize>,
    pub amount_column: Option<usize>,
    /// Outflows, stored as positive numbers in the file.
    pub debit_column: Option<usize>,
    /// Inflows, stored as positive numbers in the file.
    pub credit_column: Option<usize>,
    pub category_column: Option<usize>,
    pub date_format: String,
}

impl Default for CsvColumnMapping {
    fn default() -> Self {
        Self {
            date_column: None,
            description_column: None,
            counterparty_column: None,
            amount_column: None,
            debit_column: None,
            credit_column: None,
            category_column: None,
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvImportProfile {
    pub name: String,
    pub mapping: CsvColumnMapping,
    pub has_header: bool,
    pub delimiter: String,
    pub currency: Currency,
}

impl Default for CsvImportProfile {
    fn default() -> Self {
        Self {
            name: "Unnamed Profile".to_string(),
            mapping: CsvColumnMapping::default(),
            has_header: true,
            delimiter: ",".to_string(),
            currency: Currency::default(),
        }
    }
}

/// One parsed line of a bank export, before it is given an id.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub date: NaiveDate,
    pub description: String,
    pub counterparty: Option<String>,
    pub amount: Money,
    pub category: Option<Category>,
}

impl CsvRow {
    /// A row without a counterparty column uses its description instead, so
    /// duplicate and recurrence matching still have a name to work with.
    pub fn into_transaction(self, id: TransactionId, account_id: AccountId) -> Transaction {
        let counterparty = self
            .counterparty
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.description.trim().to_string());
        let category = self.category.unwrap_or_default();

        let mut tx = Transaction::new(id, account_id, self.date, self.amount, &self.description)
            .with_category(category);
        if !counterparty.is_empty() {
            tx = tx.with_counterparty(&counterparty);
        }
        if category == Category::Transfer {
            tx = tx.with_kind(TransactionType::Transfer);
        }
        tx
    }
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Invalid date format: {0}")]
    InvalidDate(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("No data rows")]
    NoDataRows,
}

pub struct CsvImporter;

impl CsvImporter {
    pub fn parse_profile<R: Read>(
        reader: &mut csv::Reader<R>,
        profile: &CsvImportProfile,
    ) -> Result<Vec<CsvRow>, CsvError> {
        let mapping = &profile.mapping;
        let date_col = mapping
            .date_column
            .ok_or_else(|| CsvError::MissingColumn("date_column".to_string()))?;
        if mapping.amount_column.is_none()
            && mapping.debit_column.is_none()
            && mapping.credit_column.is_none()
        {
            return Err(CsvError::MissingColumn(
                "amount_column or debit_column/credit_column".to_string(),
            ));
        }

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record = result?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            let field = record
                .get(date_col)
                .ok_or_else(|| CsvError::MissingColumn(format!("date_column {date_col}")))?;
            let date = parse_date(field, &mapping.date_format)?;

            let amount = if let Some(col) = mapping.amount_column {
                let field = record
                    .get(col)
                    .ok_or_else(|| CsvError::MissingColumn(format!("amount_column {col}")))?;
                parse_amount(field, profile.currency)?
            } else {
                let debit = optional_amount(&record, mapping.debit_column, profile.currency)?;
                let credit = optional_amount(&record, mapping.credit_column, profile.currency)?;
                match (debit, credit) {
                    (None, None) => {
                        tracing::trace!(line, "row has neither debit nor credit");
                        continue;
                    }
                    (debit, credit) => {
                        let inflow = credit.map_or(0, |m| m.amount_minor);
                        let outflow = debit.map_or(0, |m| m.amount_minor);
                        Money::from_minor(inflow - outflow, profile.currency)
                    }
                }
            };

            let description = text_column(&record, mapping.description_column).unwrap_or_default();
            let counterparty = text_column(&record, mapping.counterparty_column);
            let category = text_column(&record, mapping.category_column).and_then(|text| {
                text.parse::<Category>()
                    .map_err(|err| tracing::debug!(line, %err, "ignoring category column"))
                    .ok()
            });

            rows.push(CsvRow {
                date,
                description,
                counterparty,
                amount,
                category,
            });
        }

        if rows.is_empty() {
            return Err(CsvError::NoDataRows);
        }

        tracing::debug!(profile = %profile.name, rows = rows.len(), "parsed CSV");
        Ok(rows)
    }
}

fn text_column(record: &csv::StringRecord, column: Option<usize>) -> Option<String> {
    column
        .and_then(|col| record.get(col))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn optional_amount(
    record: &csv::StringRecord,
    column: Option<usize>,
    currency: Currency,
) -> Result<Option<Money>, CsvError> {
    column
        .and_then(|col| record.get(col))
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_amount(s, currency))
        .transpose()
}

fn parse_date(s: &str, format: &str) -> Result<NaiveDate, CsvError> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, format) {
        return Ok(date);
    }

    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| CsvError::InvalidDate(s.to_string()))
}

fn parse_amount(s: &str, currency: Currency) -> Result<Money, CsvError> {
    Money::parse(s, currency).map_err(|_| CsvError::InvalidAmount(s.trim().to_string()))
}

pub fn parse<R: Read>(
    reader: &mut csv::Reader<R>,
    profile: &CsvImportProfile,
) -> Result<Vec<CsvRow>, CsvError> {
    CsvImporter::parse_profile(reader, profile)
}

pub fn import_csv<R: Read>(data: R, profile: &CsvImportProfile) -> Result<Vec<CsvRow>, CsvError> {
    let delimiter = profile
        .delimiter
        .as_bytes()
        .first()
        .copied()
        .unwrap_or(b',');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(profile.has_header)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(data);

    parse(&mut reader, profile)
}

pub fn import_csv_file(path: &Path, profile: &CsvImportProfile) -> Result<Vec<CsvRow>, CsvError> {
    let file = File::open(path)?;
    import_csv(file, profile)
}
