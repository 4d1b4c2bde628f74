use std::collections::BTreeMap;

use cashwise_core::{Category, Frequency, Money, RecurrenceSettings, RecurringPattern, Transaction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A candidate recurring payment mined from transaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub counterparty: String,
    pub average_amount: Money,
    pub frequency: Frequency,
    pub category: Option<Category>,
    /// Ascending.
    pub occurrence_dates: Vec<NaiveDate>,
    /// 0 to 100.
    pub confidence: u8,
}

impl DetectedPattern {
    pub fn to_recurring_pattern(&self) -> RecurringPattern {
        RecurringPattern {
            id: None,
            counterparty: self.counterparty.clone(),
            amount: self.average_amount,
            frequency: self.frequency,
            category: self.category,
            active: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecurrenceDetector {
    settings: RecurrenceSettings,
}

impl RecurrenceDetector {
    pub fn new(settings: RecurrenceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RecurrenceSettings {
        &self.settings
    }

    /// Groups by counterparty, clusters each group by amount, and keeps the
    /// clusters whose average spacing falls in a known frequency bucket.
    /// Sorted by confidence, highest first.
    pub fn detect(&self, transactions: &[Transaction]) -> Vec<DetectedPattern> {
        let mut groups: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
        for tx in transactions {
            let Some(name) = tx.counterparty_name() else {
                continue;
            };
            let key = counterparty_key(name);
            if key.is_empty() {
                continue;
            }
            groups.entry(key).or_default().push(tx);
        }

        let mut detections = Vec::new();
        let mut too_small = 0usize;
        let mut irregular = 0usize;

        for (key, members) in &groups {
            for cluster in cluster_by_amount(members, self.settings.amount_tolerance) {
                if cluster.len() < self.settings.min_occurrences {
                    too_small += 1;
                    continue;
                }
                match analyze_cluster(key, &cluster) {
                    Some(pattern) => detections.push(pattern),
                    None => irregular += 1,
                }
            }
        }

        detections.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        tracing::debug!(
            groups = groups.len(),
            detected = detections.len(),
            too_small,
            irregular,
            "recurrence detection complete"
        );
        detections
    }
}

fn analyze_cluster(key: &str, cluster: &[&Transaction]) -> Option<DetectedPattern> {
    let mut dates: Vec<NaiveDate> = cluster.iter().map(|tx| tx.date).collect();
    dates.sort();

    let gaps: Vec<f64> = dates
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_days() as f64)
        .collect();
    if gaps.is_empty() {
        return None;
    }

    let mean_gap = mean(&gaps);
    let frequency = classify_frequency(mean_gap);
    if frequency == Frequency::None {
        return None;
    }
    let gap_confidence = frequency_confidence(frequency, mean_gap, std_dev(&gaps));
    tracing::trace!(key, %frequency, mean_gap, gap_confidence, "cluster classified");

    let amounts: Vec<i64> = cluster.iter().map(|tx| tx.amount.amount_minor).collect();
    let average_minor = amounts.iter().sum::<i64>() / amounts.len() as i64;

    let counterparty = cluster
        .iter()
        .min_by_key(|tx| tx.date)
        .and_then(|tx| tx.counterparty_name())
        .unwrap_or(key)
        .to_string();

    Some(DetectedPattern {
        counterparty,
        average_amount: Money::from_minor(average_minor, cluster[0].amount.currency),
        frequency,
        category: most_common_category(cluster),
        occurrence_dates: dates,
        confidence: pattern_confidence(cluster.len(), &amounts),
    })
}

/// Keeps alphanumerics and single interior spaces, lowercased and trimmed.
pub fn counterparty_key(name: &str) -> String {
    name.chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c.to_lowercase().collect::<String>())
            } else if c.is_whitespace() {
                Some(" ".to_string())
            } else {
                None
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sequential one-pass clustering over ascending absolute amounts. Each
/// cluster keeps the value that founded it as its fixed reference; a value
/// joins the current cluster when it is within `tolerance * founding`.
fn cluster_by_amount<'a>(
    members: &[&'a Transaction],
    tolerance: f64,
) -> Vec<Vec<&'a Transaction>> {
    let mut sorted = members.to_vec();
    sorted.sort_by_key(|tx| tx.amount.amount_minor.abs());

    let mut clusters: Vec<Vec<&Transaction>> = Vec::new();
    let mut founding = 0i64;
    for tx in sorted {
        let value = tx.amount.amount_minor.abs();
        match clusters.last_mut() {
            Some(current) if (value - founding) as f64 <= tolerance * founding as f64 => {
                current.push(tx);
            }
            _ => {
                founding = value;
                clusters.push(vec![tx]);
            }
        }
    }
    clusters
}

/// Buckets a mean gap in days; `Frequency::None` when it fits no bucket.
pub fn classify_frequency(mean_gap_days: f64) -> Frequency {
    match mean_gap_days {
        d if (6.0..=8.0).contains(&d) => Frequency::Weekly,
        d if (12.0..=16.0).contains(&d) => Frequency::Biweekly,
        d if (25.0..=35.0).contains(&d) => Frequency::Monthly,
        d if (85.0..=95.0).contains(&d) => Frequency::Quarterly,
        d if (355.0..=375.0).contains(&d) => Frequency::Annual,
        _ => Frequency::None,
    }
}

/// How closely the gaps fit their bucket, 0 to 100: distance of the mean
/// from the bucket's nominal period, less the truncated gap deviation.
pub fn frequency_confidence(frequency: Frequency, mean_gap: f64, gap_std_dev: f64) -> u8 {
    let base = match frequency {
        Frequency::Weekly => 100.0 - 10.0 * (mean_gap - 7.0).abs(),
        Frequency::Biweekly => 100.0 - 5.0 * (mean_gap - 14.0).abs(),
        Frequency::Monthly => 100.0 - 3.0 * (mean_gap - 30.0).abs(),
        Frequency::Quarterly => 100.0 - 2.0 * (mean_gap - 90.0).abs(),
        Frequency::Annual => 100.0 - (mean_gap - 365.0).abs(),
        Frequency::None => return 0,
    };
    let base = base.round().clamp(0.0, 100.0) as i64;
    (base - gap_std_dev.trunc() as i64).clamp(0, 100) as u8
}

/// 50 + 5 per occurrence (capped at 30) + 20 for near-constant amounts
/// (variance under 100 minor units squared) or 10 for variance under 10 000.
pub fn pattern_confidence(occurrences: usize, amounts_minor: &[i64]) -> u8 {
    let occurrence_bonus = (occurrences as i64).saturating_mul(5).min(30);
    let values: Vec<f64> = amounts_minor.iter().map(|&a| a as f64).collect();
    let spread = variance(&values);
    let amount_bonus = if spread < 100.0 {
        20
    } else if spread < 10_000.0 {
        10
    } else {
        0
    };
    (50 + occurrence_bonus + amount_bonus).clamp(0, 100) as u8
}

/// Most frequent category; ties go to the lowest ordinal.
fn most_common_category(cluster: &[&Transaction]) -> Option<Category> {
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    for tx in cluster {
        *counts.entry(tx.category).or_default() += 1;
    }
    let mut best: Option<(Category, usize)> = None;
    for (category, count) in counts {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((category, count)),
        }
    }
    best.map(|(category, _)| category)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance.
fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}
