//! RDW open data client
//!
//! Two datasets are queried per plate: the registered vehicles set for brand
//! and trade name, and the fuel set for the fuel descriptions.

use crate::core::{RegistryConfig, RegistryError, VehicleRegistry};
use serde::Deserialize;
use std::time::Duration;

const VEHICLES_DATASET: &str = "m9d7-ebf2";
const FUEL_DATASET: &str = "8ys7-d773";

#[derive(Debug, Default, Deserialize)]
struct VehicleRow {
    #[serde(default)]
    merk: Option<String>,
    #[serde(default)]
    handelsbenaming: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FuelRow {
    #[serde(default)]
    brandstof_omschrijving: Option<String>,
}

pub struct RdwRegistry {
    agent: ureq::Agent,
    base_url: String,
}

impl RdwRegistry {
    pub fn new(config: &RegistryConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        RdwRegistry {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        dataset: &str,
        plate: &str,
    ) -> Result<Vec<T>, RegistryError> {
        let url = format!("{}/{}.json", self.base_url, dataset);
        let response = self
            .agent
            .get(&url)
            .query("kenteken", plate)
            .call()
            .map_err(|e| RegistryError::Request(e.to_string()))?;
        let rows: Vec<T> = response
            .into_json()
            .map_err(|e| RegistryError::Decode(e.to_string()))?;
        log::debug!("{} rows from {} for {}", rows.len(), dataset, plate);
        Ok(rows)
    }
}

impl VehicleRegistry for RdwRegistry {
    fn brand_model(&self, plate: &str) -> Result<Option<String>, RegistryError> {
        let rows: Vec<VehicleRow> = self.fetch(VEHICLES_DATASET, plate)?;
        Ok(rows.first().and_then(brand_model))
    }

    fn fuel_types(&self, plate: &str) -> Result<Vec<String>, RegistryError> {
        let rows: Vec<FuelRow> = self.fetch(FUEL_DATASET, plate)?;
        Ok(fuel_descriptions(rows))
    }
}

fn brand_model(row: &VehicleRow) -> Option<String> {
    let parts: Vec<&str> = [row.merk.as_deref(), row.handelsbenaming.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn fuel_descriptions(rows: Vec<FuelRow>) -> Vec<String> {
    rows.into_iter()
        .filter_map(|row| row.brandstof_omschrijving)
        .map(|fuel| fuel.trim().to_string())
        .filter(|fuel| !fuel.is_empty())
        .collect()
}
