use std::collections::HashSet;

use cashwise_core::{DuplicateSettings, Money, Transaction, TransactionId};
use serde::{Deserialize, Serialize};

/// Score at or above which a pair is reported by [`DuplicateDetector::find_duplicates`].
const REPORT_THRESHOLD: f64 = 0.5;
/// Score at or above which a pair is described as a full match.
const FULL_MATCH_THRESHOLD: f64 = 0.8;

// Similarity is accumulated in tenths so tier boundaries compare exactly.
const DATE_AMOUNT_POINTS: u8 = 5;
const COUNTERPARTY_POINTS: u8 = 3;
const ACCOUNT_POINTS: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateCandidate {
    pub first: Transaction,
    pub second: Transaction,
    /// 0.0 to 1.0.
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct DuplicateDetector {
    settings: DuplicateSettings,
}

impl DuplicateDetector {
    pub fn new(settings: DuplicateSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DuplicateSettings {
        &self.settings
    }

    /// Similarity in `[0.0, 1.0]`: 0.5 for amount and date within tolerance,
    /// +0.3 for matching counterparties, +0.2 for the same account.
    pub fn similarity(&self, a: &Transaction, b: &Transaction) -> f64 {
        f64::from(self.score_points(a, b)) / 10.0
    }

    fn score_points(&self, a: &Transaction, b: &Transaction) -> u8 {
        // Mismatched currencies count as a zero delta.
        let delta = a
            .amount
            .checked_sub(b.amount)
            .unwrap_or(Money::zero(a.amount.currency));
        if delta.amount_minor.abs() > self.settings.amount_tolerance_minor {
            return 0;
        }

        let date_diff = (a.date - b.date).num_days().abs();
        if date_diff > self.settings.date_window_days {
            return 0;
        }

        let mut points = DATE_AMOUNT_POINTS;
        if self.counterparties_match(a, b) {
            points += COUNTERPARTY_POINTS;
        }
        if a.account_id == b.account_id {
            points += ACCOUNT_POINTS;
        }
        points.min(10)
    }

    fn counterparties_match(&self, a: &Transaction, b: &Transaction) -> bool {
        match (&a.counterparty, &b.counterparty) {
            (None, None) => true,
            (Some(x), Some(y)) if self.settings.normalize_counterparty => {
                normalize_counterparty(x) == normalize_counterparty(y)
            }
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Every unordered pair of distinct transactions scoring at least 0.5,
    /// highest confidence first.
    pub fn find_duplicates(&self, transactions: &[Transaction]) -> Vec<DuplicateCandidate> {
        let mut seen: HashSet<(TransactionId, TransactionId)> = HashSet::new();
        let mut candidates = Vec::new();
        let mut compared = 0usize;

        for i in 0..transactions.len() {
            for j in (i + 1)..transactions.len() {
                let t1 = &transactions[i];
                let t2 = &transactions[j];
                if t1.id == t2.id {
                    continue;
                }
                compared += 1;

                let confidence = self.similarity(t1, t2);
                if confidence < REPORT_THRESHOLD {
                    continue;
                }
                if !seen.insert((t1.id.min(t2.id), t1.id.max(t2.id))) {
                    continue;
                }
                candidates.push(build_candidate(t1, t2, confidence));
            }
        }

        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        tracing::debug!(
            transactions = transactions.len(),
            compared,
            found = candidates.len(),
            "duplicate scan complete"
        );
        candidates
    }

    /// First existing transaction scoring strictly above 0.5 against
    /// `candidate`. A bare date+amount match (exactly 0.5) is not enough.
    pub fn is_duplicate(
        &self,
        candidate: &Transaction,
        existing: &[Transaction],
    ) -> Option<DuplicateCandidate> {
        existing.iter().find_map(|other| {
            let confidence = self.similarity(candidate, other);
            (confidence > REPORT_THRESHOLD).then(|| build_candidate(candidate, other, confidence))
        })
    }
}

fn build_candidate(
    first: &Transaction,
    second: &Transaction,
    confidence: f64,
) -> DuplicateCandidate {
    let reason = if confidence >= FULL_MATCH_THRESHOLD {
        "full match"
    } else {
        "date+amount match within window"
    };
    DuplicateCandidate {
        first: first.clone(),
        second: second.clone(),
        confidence,
        reason: reason.to_string(),
    }
}

/// Lowercases, collapses runs of spaces and tabs to one space, and trims.
/// Punctuation is left alone.
pub fn normalize_counterparty(name: &str) -> String {
    name.to_lowercase()
        .split([' ', '\t'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashwise_core::{AccountId, Currency};
    use chrono::NaiveDate;

    fn tx(
        id: i64,
        account: i64,
        date: (i32, u32, u32),
        cp: Option<&str>,
        amount: i64,
    ) -> Transaction {
        let mut t = Transaction::new(
            TransactionId(id),
            AccountId(account),
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            Money::from_minor(amount, Currency::Usd),
            "card purchase",
        );
        t.counterparty = cp.map(str::to_string);
        t
    }

    #[test]
    fn identical_transactions_score_one() {
        let d = DuplicateDetector::default();
        let a = tx(1, 1, (2024, 1, 15), Some("STARBUCKS  #12"), -500);
        let b = tx(2, 1, (2024, 1, 15), Some("starbucks #12 "), -500);
        assert_eq!(d.similarity(&a, &b), 1.0);
    }

    #[test]
    fn amount_outside_tolerance_scores_zero() {
        let d = DuplicateDetector::default();
        let a = tx(1, 1, (2024, 1, 15), Some("A"), -500);
        let b = tx(2, 1, (2024, 1, 15), Some("A"), -501);
        assert_eq!(d.similarity(&a, &b), 0.0);

        let lenient = DuplicateDetector::new(DuplicateSettings {
            amount_tolerance_minor: 1,
            ..DuplicateSettings::default()
        });
        assert_eq!(lenient.similarity(&a, &b), 1.0);
    }

    #[test]
    fn date_outside_window_scores_zero() {
        let d = DuplicateDetector::default();
        let a = tx(1, 1, (2024, 1, 15), None, -500);
        let b = tx(2, 1, (2024, 1, 16), None, -500);
        let c = tx(3, 1, (2024, 1, 17), None, -500);
        assert_eq!(d.similarity(&a, &b), 1.0);
        assert_eq!(d.similarity(&a, &c), 0.0);
    }

    #[test]
    fn partial_scores() {
        let d = DuplicateDetector::default();
        let a = tx(1, 1, (2024, 1, 15), Some("Amazon"), -500);
        let other_account = tx(2, 2, (2024, 1, 15), Some("amazon"), -500);
        let other_name = tx(3, 1, (2024, 1, 15), Some("Target"), -500);
        let nothing = tx(4, 2, (2024, 1, 15), None, -500);
        assert_eq!(d.similarity(&a, &other_account), 0.8);
        assert_eq!(d.similarity(&a, &other_name), 0.7);
        assert_eq!(d.similarity(&a, &nothing), 0.5);
    }

    #[test]
    fn normalization_can_be_disabled() {
        let d = DuplicateDetector::new(DuplicateSettings {
            normalize_counterparty: false,
            ..DuplicateSettings::default()
        });
        let a = tx(1, 1, (2024, 1, 15), Some("Amazon"), -500);
        let b = tx(2, 1, (2024, 1, 15), Some("AMAZON"), -500);
        assert_eq!(d.similarity(&a, &b), 0.7);
    }

    #[test]
    fn mismatched_currency_counts_as_same_amount() {
        let d = DuplicateDetector::default();
        let a = tx(1, 1, (2024, 1, 15), None, -500);
        let mut b = tx(2, 1, (2024, 1, 15), None, -900);
        b.amount = Money::from_minor(-900, Currency::Eur);
        assert_eq!(d.similarity(&a, &b), 1.0);
    }

    #[test]
    fn find_duplicates_orders_and_labels() {
        let d = DuplicateDetector::default();
        let txs = vec![
            tx(1, 1, (2024, 1, 15), Some("Shell"), -4000),
            tx(2, 2, (2024, 1, 15), None, -4000),
            tx(3, 1, (2024, 1, 16), Some("shell"), -4000),
            tx(4, 1, (2024, 3, 1), Some("Rent"), -150_000),
        ];
        let dups = d.find_duplicates(&txs);
        assert_eq!(dups.len(), 3);
        assert_eq!((dups[0].first.id, dups[0].second.id), (TransactionId(1), TransactionId(3)));
        assert_eq!(dups[0].confidence, 1.0);
        assert_eq!(dups[0].reason, "full match");
        assert!(dups[1..].iter().all(|c| c.confidence == 0.5));
        assert!(dups[1..].iter().all(|c| c.reason == "date+amount match within window"));
    }

    #[test]
    fn equal_confidence_pairs_keep_discovery_order() {
        let d = DuplicateDetector::default();
        let txs = vec![
            tx(3, 3, (2024, 1, 15), Some("Shell"), -700),
            tx(4, 4, (2024, 1, 15), Some("Esso"), -700),
            tx(1, 1, (2024, 1, 15), Some("Aldi"), -500),
            tx(2, 2, (2024, 1, 15), Some("Lidl"), -500),
            tx(5, 1, (2024, 1, 20), Some("Netflix"), -900),
            tx(6, 1, (2024, 1, 20), Some("Netflix"), -900),
        ];
        let pairs: Vec<(i64, i64, f64)> = d
            .find_duplicates(&txs)
            .iter()
            .map(|c| (c.first.id.0, c.second.id.0, c.confidence))
            .collect();
        assert_eq!(pairs, vec![(5, 6, 1.0), (3, 4, 0.5), (1, 2, 0.5)]);
    }

    #[test]
    fn find_duplicates_has_no_self_or_symmetric_pairs() {
        let d = DuplicateDetector::default();
        let a = tx(1, 1, (2024, 1, 15), Some("X"), -100);
        let b = tx(2, 1, (2024, 1, 15), Some("X"), -100);
        let txs = vec![a.clone(), b.clone(), a.clone(), b];
        let dups = d.find_duplicates(&txs);
        assert_eq!(dups.len(), 1);
        let ids: Vec<_> = dups.iter().map(|c| (c.first.id, c.second.id)).collect();
        assert_eq!(ids, vec![(TransactionId(1), TransactionId(2))]);
    }

    #[test]
    fn rerun_on_same_transactions_by_id_is_empty() {
        let d = DuplicateDetector::default();
        let a = tx(7, 1, (2024, 1, 15), Some("X"), -100);
        assert!(d.find_duplicates(&[a.clone(), a.clone(), a]).is_empty());
    }

    #[test]
    fn is_duplicate_requires_more_than_date_and_amount() {
        let d = DuplicateDetector::default();
        let incoming = tx(10, 1, (2024, 1, 15), Some("Shell"), -4000);
        let weak = tx(1, 2, (2024, 1, 15), Some("BP"), -4000);
        assert!(d.is_duplicate(&incoming, &[weak.clone()]).is_none());

        let strong = tx(2, 2, (2024, 1, 16), Some("SHELL"), -4000);
        let hit = d.is_duplicate(&incoming, &[weak, strong]).unwrap();
        assert_eq!(hit.second.id, TransactionId(2));
        assert_eq!(hit.confidence, 0.8);
    }

    #[test]
    fn normalize_collapses_whitespace_only() {
        assert_eq!(normalize_counterparty("  Joe's\t\tPIZZA  Co. "), "joe's pizza co.");
    }
}
