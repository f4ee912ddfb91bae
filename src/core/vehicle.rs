//! Vehicle enrichment: plate detection, registry resolution and the verdict
//! override for vehicle purchases.

use super::config::ScanConfig;
use super::verdict::{Category, RuleKind, Verdict};
use regex::Regex;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::thread;

pub const UNKNOWN_BRAND: &str = "Unknown";

/// Dutch licence plate side codes, most recent series first
const PLATE_SHAPES: &[&str] = &[
    r"[A-Z]{2}-\d{3}-[A-Z]",
    r"[A-Z]-\d{3}-[A-Z]{2}",
    r"[A-Z]{3}-\d{2}-[A-Z]",
    r"[A-Z]-\d{2}-[A-Z]{3}",
    r"\d-[A-Z]{2}-\d{3}",
    r"\d{3}-[A-Z]{2}-\d",
    r"\d{2}-[A-Z]{3}-\d",
    r"\d-[A-Z]{3}-\d{2}",
    r"[A-Z]{2}-\d{2}-\d{2}",
    r"\d{2}-\d{2}-[A-Z]{2}",
    r"\d{2}-[A-Z]{2}-\d{2}",
    r"[A-Z]{2}-\d{2}-[A-Z]{2}",
    r"[A-Z]{2}-[A-Z]{2}-\d{2}",
    r"\d{2}-[A-Z]{2}-[A-Z]{2}",
];

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Request(String),
    #[error("unexpected registry response: {0}")]
    Decode(String),
}

/// A licence plate found in a description
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Plate {
    /// As written, uppercased (`AB-123-C`)
    pub display: String,
    /// Registry key, separators stripped (`AB123C`)
    pub normalized: String,
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

fn plate_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        PLATE_SHAPES
            .iter()
            .map(|shape| Regex::new(&format!(r"(?i)\b{shape}\b")).expect("invalid plate regex"))
            .collect()
    })
}

/// First plate-shaped token in the text, trying the side codes in order
pub fn detect_plate(text: &str) -> Option<Plate> {
    plate_res().iter().find_map(|re| {
        re.find(text).map(|m| {
            let display = m.as_str().to_uppercase();
            let normalized = display.replace('-', "");
            Plate { display, normalized }
        })
    })
}

/// Registry data for one vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VehicleRecord {
    pub plate: String,
    pub brand_model: String,
    pub fuel_descriptions: BTreeSet<String>,
    pub is_electric: bool,
}

/// Read-only vehicle registry keyed by normalized plate
pub trait VehicleRegistry: Sync {
    /// Brand and model, `None` when the plate is unknown
    fn brand_model(&self, plate: &str) -> Result<Option<String>, RegistryError>;
    /// Registered fuel descriptions, empty when the plate is unknown
    fn fuel_types(&self, plate: &str) -> Result<Vec<String>, RegistryError>;
}

fn mentions_electricity(fuel: &str) -> bool {
    let fuel = fuel.to_lowercase();
    fuel.contains("elektr") || fuel.contains("electr")
}

/// Look up a plate. Lookup failures degrade to an unknown brand or an empty
/// fuel set; `None` only when neither lookup produced anything.
pub fn resolve(registry: &dyn VehicleRegistry, plate: &Plate) -> Option<VehicleRecord> {
    let brand = registry
        .brand_model(&plate.normalized)
        .unwrap_or_else(|err| {
            log::warn!("Brand lookup for {} failed: {}", plate, err);
            None
        });

    let fuels: BTreeSet<String> = registry
        .fuel_types(&plate.normalized)
        .unwrap_or_else(|err| {
            log::warn!("Fuel lookup for {} failed: {}", plate, err);
            Vec::new()
        })
        .into_iter()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();

    if brand.is_none() && fuels.is_empty() {
        log::info!("No registry record for {}", plate);
        return None;
    }

    Some(VehicleRecord {
        plate: plate.display.clone(),
        brand_model: brand.unwrap_or_else(|| UNKNOWN_BRAND.to_string()),
        is_electric: fuels.iter().any(|f| mentions_electricity(f)),
        fuel_descriptions: fuels,
    })
}

/// Resolve plates on at most `workers` threads. Results line up with `plates`.
pub fn resolve_all(
    registry: &dyn VehicleRegistry,
    plates: &[Plate],
    workers: usize,
) -> Vec<Option<VehicleRecord>> {
    let mut results = vec![None; plates.len()];
    if plates.is_empty() {
        return results;
    }

    let workers = workers.clamp(1, plates.len());
    let next = AtomicUsize::new(0);
    log::info!("Resolving {} plates with {} workers", plates.len(), workers);

    let batches: Vec<Vec<(usize, Option<VehicleRecord>)>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut resolved = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(plate) = plates.get(index) else {
                            break;
                        };
                        resolved.push((index, resolve(registry, plate)));
                    }
                    resolved
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle.join().unwrap_or_else(|_| {
                    log::warn!("Registry worker panicked, its plates stay unverified");
                    Vec::new()
                })
            })
            .collect()
    });

    for (index, record) in batches.into_iter().flatten() {
        results[index] = record;
    }
    results
}

/// Override a cascade verdict with registry data.
///
/// Exclusions always stand. Below the floor only the non-electric outcome is
/// applied, since it cannot raise the benefit.
pub fn enrich<'a>(
    mut verdict: Verdict<'a>,
    plate: &Plate,
    record: Option<VehicleRecord>,
    config: &ScanConfig,
) -> Verdict<'a> {
    if verdict.rule == RuleKind::Exclusion {
        return verdict;
    }

    match record {
        Some(record) if !record.fuel_descriptions.is_empty() => {
            if record.is_electric {
                if verdict.rule == RuleKind::StatutoryFloor {
                    verdict.vehicle = Some(record);
                    return verdict;
                }
                verdict.category = Category::SebaMia;
                verdict.rate = config.seba_mia_rate;
                verdict.bonus = config.seba_bonus;
                verdict.rationale = format!(
                    "electric vehicle {} ({}): SEBA subsidy plus MIA",
                    plate, record.brand_model
                );
            } else {
                let fuels: Vec<&str> = record.fuel_descriptions.iter().map(String::as_str).collect();
                verdict.category = Category::None;
                verdict.rate = Decimal::ZERO;
                verdict.bonus = Decimal::ZERO;
                verdict.rationale = format!(
                    "fuel-powered vehicle, not incentive-eligible ({} {}, {})",
                    plate,
                    record.brand_model,
                    fuels.join("/")
                );
            }
            verdict.rule = RuleKind::VehicleRegistry;
            verdict.vehicle = Some(record);
        }
        record => {
            verdict.rationale = format!("{}; unverified vehicle {}", verdict.rationale, plate);
            verdict.vehicle = record;
        }
    }
    verdict
}
