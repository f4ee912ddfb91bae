use super::config::ScanConfig;
use super::dedup::{dedup, CandidateSet};
use super::ledger::Ledger;
use super::report::Report;
use super::rules::RuleEngine;
use super::vehicle::{detect_plate, enrich, resolve_all, Plate, VehicleRecord, VehicleRegistry};
use super::verdict::{RuleKind, Verdict};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

/// Run the whole pipeline over one export file.
///
/// Passing no registry skips vehicle lookups; vehicle postings are then
/// reported as unverified.
pub fn scan(bytes: &[u8], config: &ScanConfig, registry: Option<&dyn VehicleRegistry>) -> Report {
    let ledger = Ledger::from_bytes(bytes, config.extract);
    let extraction = ledger.stats();
    log::info!(
        "Found {} ledger lines, {} usable ({} skipped)",
        extraction.lines_found,
        extraction.emitted,
        extraction.skipped()
    );

    let candidates = dedup(ledger.transactions());
    let engine = RuleEngine::new(config.clone());
    let verdicts = classify_candidates(&candidates, &engine, registry);

    let mut report = Report::from_verdicts(&verdicts);
    report.source_sha256 = Some(hex::encode(Sha256::digest(bytes)));
    report.extraction = extraction;
    report.duplicates = candidates.duplicates();

    log::info!(
        "Classified {} candidates, {} eligible, total benefit {}",
        report.item_count,
        report.eligible_count,
        report.total_benefit
    );
    report
}

/// Classify candidates and apply registry data to vehicle postings.
/// Verdicts come back in candidate order.
pub fn classify_candidates<'a>(
    candidates: &'a CandidateSet,
    engine: &RuleEngine,
    registry: Option<&dyn VehicleRegistry>,
) -> Vec<Verdict<'a>> {
    let verdicts: Vec<Verdict<'a>> = candidates.iter().map(|tx| engine.classify(tx)).collect();

    let vehicle_plates: HashMap<usize, Plate> = verdicts
        .iter()
        .enumerate()
        .filter(|(_, verdict)| verdict.rule != RuleKind::Exclusion)
        .filter_map(|(index, verdict)| {
            detect_plate(&verdict.transaction.description).map(|plate| (index, plate))
        })
        .collect();

    if vehicle_plates.is_empty() {
        return verdicts;
    }

    let records = lookup_plates(registry, &vehicle_plates, engine.config().registry.workers);

    verdicts
        .into_iter()
        .enumerate()
        .map(|(index, verdict)| match vehicle_plates.get(&index) {
            Some(plate) => {
                let record = records.get(&plate.normalized).cloned().flatten();
                enrich(verdict, plate, record, engine.config())
            }
            None => verdict,
        })
        .collect()
}

/// Each distinct plate is looked up once per batch
fn lookup_plates(
    registry: Option<&dyn VehicleRegistry>,
    vehicle_plates: &HashMap<usize, Plate>,
    workers: usize,
) -> HashMap<String, Option<VehicleRecord>> {
    let Some(registry) = registry else {
        log::info!(
            "Registry lookups disabled, {} vehicle postings stay unverified",
            vehicle_plates.len()
        );
        return HashMap::new();
    };

    let mut indices: Vec<&usize> = vehicle_plates.keys().collect();
    indices.sort();
    let mut seen = HashSet::new();
    let unique: Vec<Plate> = indices
        .into_iter()
        .map(|index| &vehicle_plates[index])
        .filter(|plate| seen.insert(plate.normalized.clone()))
        .cloned()
        .collect();

    let records = resolve_all(registry, &unique, workers);
    unique
        .into_iter()
        .map(|plate| plate.normalized)
        .zip(records)
        .collect()
}
