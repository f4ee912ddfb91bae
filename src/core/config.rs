//! Policy constants of the scanner.
//!
//! The rates and thresholds are simplified heuristics, not statutory figures,
//! so all of them can be overridden from a JSON file.

use super::ledger::ExtractOptions;
use super::payroll::PayrollConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Inclusive range of ledger account numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AccountRange {
    pub start: u32,
    pub end: u32,
}

impl AccountRange {
    pub fn contains(&self, account: u32) -> bool {
        (self.start..=self.end).contains(&account)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL of the RDW open data API
    pub base_url: String,
    /// Per request timeout
    pub timeout_secs: u64,
    /// Maximum number of concurrent plate lookups
    pub workers: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            base_url: "https://opendata.rdw.nl/resource".to_string(),
            timeout_secs: 5,
            workers: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScanConfig {
    /// Minimum amount per asset below which no incentive applies
    #[schemars(with = "f64")]
    pub floor: Decimal,
    /// KIA benefit rate
    #[schemars(with = "f64")]
    pub general_rate: Decimal,
    /// Optional upper bound for KIA candidates
    #[schemars(with = "Option<f64>")]
    pub general_max_amount: Option<Decimal>,
    /// Accounts holding tangible fixed assets
    pub tangible_accounts: AccountRange,
    /// MIA/EIA and VAMIL benefit rate
    #[schemars(with = "f64")]
    pub sustainable_rate: Decimal,
    /// Sustainable categories need an amount strictly above this
    #[schemars(with = "f64")]
    pub sustainable_min_amount: Decimal,
    /// Fixed SEBA subsidy per electric vehicle
    #[schemars(with = "f64")]
    pub seba_bonus: Decimal,
    /// MIA rate applied on top of the SEBA subsidy
    #[schemars(with = "f64")]
    pub seba_mia_rate: Decimal,
    pub extract: ExtractOptions,
    pub registry: RegistryConfig,
    pub payroll: PayrollConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            floor: dec!(450),
            general_rate: dec!(0.28),
            general_max_amount: None,
            tangible_accounts: AccountRange { start: 100, end: 199 },
            sustainable_rate: dec!(0.135),
            sustainable_min_amount: dec!(2500),
            seba_bonus: dec!(5000),
            seba_mia_rate: dec!(0.135),
            extract: ExtractOptions::default(),
            registry: RegistryConfig::default(),
            payroll: PayrollConfig::default(),
        }
    }
}

impl ScanConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        let config: ScanConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("general_rate", self.general_rate),
            ("sustainable_rate", self.sustainable_rate),
            ("seba_mia_rate", self.seba_mia_rate),
        ];
        for (name, rate) in rates {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 0 and 1, got {rate}"
                )));
            }
        }
        if self.tangible_accounts.start > self.tangible_accounts.end {
            return Err(ConfigError::Invalid(
                "tangible_accounts start is after end".to_string(),
            ));
        }
        if self.registry.workers == 0 {
            return Err(ConfigError::Invalid(
                "registry.workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
