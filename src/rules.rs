//! Table-driven cleaning rules for categorical columns.
//!
//! The city alias table and the weekday override live here as data rather
//! than as inline conditionals, so the business rules stay auditable and can
//! be swapped out via a TOML file (`--rules`) without touching the loader.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Normalization tables applied by the loader.
///
/// The default weekday override folds `SÁBADO` into `SEXTA-FEIRA`. That is
/// not a typo fix: Saturday deliveries are invoiced on the Friday run, so
/// the operation wants them reported under Friday. Keep the rule intact.
#[derive(Debug, Clone, Deserialize)]
pub struct CleaningRules {
    /// Alias -> canonical city name, keyed by the uppercased, trimmed form.
    #[serde(default = "default_city_aliases")]
    pub city_aliases: HashMap<String, String>,

    /// Weekday name -> replacement weekday name, applied before parsing.
    #[serde(default = "default_weekday_overrides")]
    pub weekday_overrides: HashMap<String, String>,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            city_aliases: default_city_aliases(),
            weekday_overrides: default_weekday_overrides(),
        }
    }
}

fn default_city_aliases() -> HashMap<String, String> {
    HashMap::from([("AMPÉRE".to_string(), "AMPERE".to_string())])
}

fn default_weekday_overrides() -> HashMap<String, String> {
    HashMap::from([("SÁBADO".to_string(), "SEXTA-FEIRA".to_string())])
}

impl CleaningRules {
    /// Load rules from a TOML file. Missing tables fall back to the
    /// defaults, so a file may override just one of them.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file: {}", path.display()))?;
        let rules: CleaningRules = toml::from_str(&content)
            .with_context(|| format!("Failed to parse rules file: {}", path.display()))?;
        Ok(rules)
    }

    /// Canonical city spelling: uppercase, trimmed, alias-collapsed.
    pub fn normalize_city(&self, raw: &str) -> String {
        let city = raw.trim().to_uppercase();
        match self.city_aliases.get(&city) {
            Some(canonical) => canonical.clone(),
            None => city,
        }
    }

    /// Apply the weekday override table to an uppercased, trimmed name.
    pub fn map_weekday(&self, raw: &str) -> String {
        let day = raw.trim().to_uppercase();
        match self.weekday_overrides.get(&day) {
            Some(replacement) => replacement.clone(),
            None => day,
        }
    }
}
