pub mod csv;
pub mod profiles;
pub mod rules;
pub(crate) mod util;

pub use csv::{CsvColumnMapping, CsvError, CsvImportProfile, CsvRow};
pub use profiles::ImportConfig;
pub use rules::{CategoryRule, CategoryRuleEngine, MatchType as RuleMatchType, RuleError};

pub mod import {
    use std::path::Path;

    use cashwise_core::{AccountId, IdSequence, Transaction};

    use crate::{CsvError, CsvImportProfile};

    /// Parses `path` with `profile` and numbers the rows from `ids`.
    pub fn import_csv_with_profile(
        path: &Path,
        profile: &CsvImportProfile,
        account_id: AccountId,
        ids: &mut IdSequence,
    ) -> Result<Vec<Transaction>, CsvError> {
        let rows = crate::csv::import_csv_file(path, profile)?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_transaction(ids.next_id(), account_id))
            .collect())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::CsvColumnMapping;
        use cashwise_core::TransactionId;

        #[test]
        fn numbers_rows_after_existing_ids() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("bank.csv");
            std::fs::write(&path, "date,description,amount\n2024-01-15,A,-1\n2024-01-16,B,-2\n")
                .unwrap();
            let profile = CsvImportProfile {
                mapping: CsvColumnMapping {
                    date_column: Some(0),
                    description_column: Some(1),
                    amount_column: Some(2),
                    ..CsvColumnMapping::default()
                },
                ..CsvImportProfile::default()
            };
            let mut ids = IdSequence::starting_after(Some(TransactionId(41)));
            let txs = import_csv_with_profile(&path, &profile, AccountId(3), &mut ids).unwrap();
            let got: Vec<_> = txs.iter().map(|t| (t.id.0, t.account_id.0)).collect();
            assert_eq!(got, vec![(42, 3), (43, 3)]);
            assert_eq!(ids.next_id(), TransactionId(44));
        }
    }
}
