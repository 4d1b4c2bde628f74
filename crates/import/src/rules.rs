use cashwise_core::{Category, Transaction};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::util::similarity_ratio;

#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Invalid rules file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid regex in rule '{rule}': {source}")]
    InvalidRegex {
        rule: String,
        #[source]
        source: regex::Error,
    },
}

/// Assigns `category` to transactions whose counterparty or description
/// matches `pattern`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    pub pattern: String,
    #[serde(default)]
    pub match_type: MatchType,
    pub category: Category,
    /// Bounds on the absolute amount, in minor units, inclusive.
    #[serde(default)]
    pub amount_min_minor: Option<i64>,
    #[serde(default)]
    pub amount_max_minor: Option<i64>,
}

/// Written in config files as `contains`, `exact`, `regex` or `fuzzy:0.8`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(try_from = "String", into = "String")]
pub enum MatchType {
    #[default]
    Contains,
    Exact,
    Regex,
    Fuzzy {
        threshold: f32,
    },
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "contains" => Ok(MatchType::Contains),
            "exact" => Ok(MatchType::Exact),
            "regex" => Ok(MatchType::Regex),
            s if s.starts_with("fuzzy:") => {
                let threshold = s[6..]
                    .parse::<f32>()
                    .map_err(|_| "Invalid fuzzy threshold".to_string())?;
                Ok(MatchType::Fuzzy { threshold })
            }
            other => Err(format!("Unknown match type: '{other}'")),
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchType::Contains => f.write_str("contains"),
            MatchType::Exact => f.write_str("exact"),
            MatchType::Regex => f.write_str("regex"),
            MatchType::Fuzzy { threshold } => write!(f, "fuzzy:{threshold}"),
        }
    }
}

impl TryFrom<String> for MatchType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MatchType> for String {
    fn from(value: MatchType) -> Self {
        value.to_string()
    }
}

#[derive(Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<CategoryRule>,
}

/// A rule with its precompiled regex and the number of transactions it has
/// categorized.
struct CompiledRule {
    rule: CategoryRule,
    compiled_regex: Option<regex::Regex>,
    hits: usize,
}

pub struct CategoryRuleEngine {
    rules: Vec<CompiledRule>,
}

impl CategoryRuleEngine {
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self, RuleError> {
        let mut compiled = rules
            .into_iter()
            .map(|rule| -> Result<CompiledRule, RuleError> {
                let compiled_regex = match &rule.match_type {
                    MatchType::Regex => Some(regex::Regex::new(&rule.pattern).map_err(
                        |source| RuleError::InvalidRegex {
                            rule: rule.name.clone(),
                            source,
                        },
                    )?),
                    _ => None,
                };
                Ok(CompiledRule {
                    rule,
                    compiled_regex,
                    hits: 0,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        // Highest priority first; equal priorities keep file order.
        compiled.sort_by(|a, b| b.rule.priority.cmp(&a.rule.priority));
        Ok(Self { rules: compiled })
    }

    /// Reads the `[[rules]]` tables of a TOML document. Other tables are
    /// ignored.
    pub fn from_toml(toml_content: &str) -> Result<Self, RuleError> {
        let file: RuleFile = toml::from_str(toml_content)?;
        Self::new(file.rules)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn find_matching_rule(&self, tx: &Transaction) -> Option<&CategoryRule> {
        self.position(tx).map(|idx| &self.rules[idx].rule)
    }

    fn position(&self, tx: &Transaction) -> Option<usize> {
        self.rules.iter().position(|cr| rule_matches(cr, tx))
    }

    /// Sets the category of every `Uncategorized` transaction that a rule
    /// matches and returns how many were changed. Categories already set by
    /// the bank export are left alone.
    pub fn categorize(&mut self, transactions: &mut [Transaction]) -> usize {
        let mut changed = 0;
        for tx in transactions
            .iter_mut()
            .filter(|tx| tx.category == Category::Uncategorized)
        {
            if let Some(idx) = self.position(tx) {
                let compiled = &mut self.rules[idx];
                tx.category = compiled.rule.category;
                compiled.hits += 1;
                changed += 1;
                tracing::trace!(rule = %compiled.rule.name, id = %tx.id, "categorized");
            }
        }
        tracing::debug!(
            transactions = transactions.len(),
            changed,
            "categorization complete"
        );
        changed
    }

    /// Rule names with the number of transactions each has categorized, in
    /// evaluation order.
    pub fn hit_counts(&self) -> Vec<(&str, usize)> {
        self.rules
            .iter()
            .map(|cr| (cr.rule.name.as_str(), cr.hits))
            .collect()
    }
}

fn rule_matches(cr: &CompiledRule, tx: &Transaction) -> bool {
    let rule = &cr.rule;

    let magnitude = tx.amount.amount_minor.abs();
    if rule.amount_min_minor.is_some_and(|min| magnitude < min) {
        return false;
    }
    if rule.amount_max_minor.is_some_and(|max| magnitude > max) {
        return false;
    }

    let pattern = rule.pattern.to_lowercase();
    [tx.counterparty_name(), Some(tx.description.trim())]
        .into_iter()
        .flatten()
        .filter(|text| !text.is_empty())
        .any(|text| match &rule.match_type {
            MatchType::Contains => text.to_lowercase().contains(&pattern),
            MatchType::Exact => text.to_lowercase() == pattern,
            MatchType::Regex => cr
                .compiled_regex
                .as_ref()
                .is_some_and(|re| re.is_match(text)),
            MatchType::Fuzzy { threshold } => {
                similarity_ratio(&text.to_lowercase(), &pattern) >= *threshold
            }
        })
}
