use super::ledger::ExtractStats;
use super::payroll::PayrollIncentive;
use super::vehicle::VehicleRecord;
use super::verdict::{Category, Verdict};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One classified posting as handed to report consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportItem {
    pub category: Category,
    pub account_id: String,
    pub description: String,
    #[schemars(with = "f64")]
    pub amount: Decimal,
    #[schemars(with = "f64")]
    pub rate: Decimal,
    #[schemars(with = "f64")]
    pub bonus: Decimal,
    #[schemars(with = "f64")]
    pub benefit: Decimal,
    pub rationale: String,
    #[serde(default)]
    #[schemars(with = "Option<String>")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub vehicle: Option<VehicleRecord>,
}

impl From<&Verdict<'_>> for ReportItem {
    fn from(verdict: &Verdict<'_>) -> Self {
        ReportItem {
            category: verdict.category,
            account_id: verdict.transaction.account_id.clone(),
            description: verdict.transaction.description.clone(),
            amount: verdict.transaction.amount,
            rate: verdict.rate,
            bonus: verdict.bonus,
            benefit: verdict.benefit(),
            rationale: verdict.rationale.clone(),
            date: verdict.transaction.date,
            vehicle: verdict.vehicle.clone(),
        }
    }
}

/// Result of scanning one export
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    /// SHA-256 of the scanned file
    #[serde(default)]
    pub source_sha256: Option<String>,
    /// Benefit over eligible items plus payroll incentives
    #[schemars(with = "f64")]
    pub total_benefit: Decimal,
    pub item_count: usize,
    pub eligible_count: usize,
    /// Every classified candidate, in processing order
    pub items: Vec<ReportItem>,
    #[serde(default)]
    pub payroll: Vec<PayrollIncentive>,
    #[serde(default)]
    pub extraction: ExtractStats,
    /// Postings collapsed as the second leg of an already seen event
    #[serde(default)]
    pub duplicates: usize,
}

impl Report {
    /// Aggregate verdicts. Only eligible categories contribute to the total.
    pub fn from_verdicts(verdicts: &[Verdict<'_>]) -> Self {
        let items: Vec<ReportItem> = verdicts.iter().map(ReportItem::from).collect();
        let eligible: Vec<&ReportItem> = items.iter().filter(|i| i.category.is_eligible()).collect();
        let total_benefit = sum(eligible.iter().map(|i| i.benefit));

        Report {
            total_benefit,
            item_count: items.len(),
            eligible_count: eligible.len(),
            items,
            ..Report::default()
        }
    }

    pub fn merge_payroll(&mut self, incentives: Vec<PayrollIncentive>) {
        self.total_benefit = self
            .total_benefit
            .saturating_add(sum(incentives.iter().map(|i| i.amount)));
        self.payroll.extend(incentives);
    }

    pub fn eligible_items(&self) -> impl Iterator<Item = &ReportItem> {
        self.items.iter().filter(|i| i.category.is_eligible())
    }

    pub fn investment_benefit(&self) -> Decimal {
        sum(self.eligible_items().map(|i| i.benefit))
    }

    pub fn payroll_benefit(&self) -> Decimal {
        sum(self.payroll.iter().map(|i| i.amount))
    }

    /// Eligible investment and benefit per category
    pub fn totals_by_category(&self) -> BTreeMap<Category, (Decimal, Decimal)> {
        let mut totals: BTreeMap<Category, (Decimal, Decimal)> = BTreeMap::new();
        for item in self.eligible_items() {
            let entry = totals.entry(item.category).or_default();
            entry.0 = entry.0.saturating_add(item.amount);
            entry.1 = entry.1.saturating_add(item.benefit);
        }
        totals
    }

    /// No posting was recognised in the input at all
    pub fn nothing_recognized(&self) -> bool {
        self.item_count == 0
    }
}

/// Saturates instead of panicking on overflow
fn sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}
