use serde::Deserialize;

use crate::csv::CsvImportProfile;
use crate::rules::{CategoryRule, CategoryRuleEngine, RuleError};

/// The import-related tables of the config file: `[[rules]]` and
/// `[[profiles]]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub rules: Vec<CategoryRule>,
    pub profiles: Vec<CsvImportProfile>,
}

impl ImportConfig {
    pub fn from_toml(content: &str) -> Result<Self, RuleError> {
        Ok(toml::from_str(content)?)
    }

    /// Looks a profile up by name, ignoring case.
    pub fn profile(&self, name: &str) -> Option<&CsvImportProfile> {
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn rule_engine(&self) -> Result<CategoryRuleEngine, RuleError> {
        CategoryRuleEngine::new(self.rules.clone())
    }
}
