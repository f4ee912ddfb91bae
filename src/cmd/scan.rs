//! Scan command - classify the postings of one ledger export

use crate::cmd::{load_config, read_input};
use crate::core::{
    assess_all, format_amount, read_employees, scan, Report, ReportItem, ScanConfig,
    VehicleRegistry,
};
use crate::registry::RdwRegistry;
use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ScanCommand {
    /// Ledger audit file (XAF), or "-" to read stdin
    #[arg(short, long)]
    file: PathBuf,

    /// JSON file overriding rates and thresholds
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip vehicle registry lookups
    #[arg(long)]
    offline: bool,

    /// Payroll CSV sheet to include wage subsidies
    #[arg(short, long)]
    payroll: Option<PathBuf>,

    /// Ignore postings on accounts at or above this number
    #[arg(long)]
    max_account: Option<u32>,

    /// Only consider debit postings
    #[arg(long)]
    debit_only: bool,

    /// Keep opening balance and depreciation postings
    #[arg(long)]
    keep_non_investments: bool,

    /// List every classified posting, not only eligible ones
    #[arg(short, long)]
    all: bool,

    /// Output as CSV instead of formatted table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output the full report as JSON
    #[arg(long)]
    json: bool,
}

impl ScanCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let config = self.config()?;
        let input = read_input(&self.file)?;

        let registry = (!self.offline).then(|| RdwRegistry::new(&config.registry));
        let registry = registry.as_ref().map(|r| r as &dyn VehicleRegistry);
        let mut report = scan(&input, &config, registry);

        if let Some(path) = &self.payroll {
            let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
            let employees = read_employees(BufReader::new(file))
                .with_context(|| format!("cannot read payroll sheet {}", path.display()))?;
            report.merge_payroll(assess_all(&employees, &config.payroll));
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        let rows = build_rows(&report, self.all);
        if self.csv {
            self.write_csv(&rows)
        } else {
            self.print_report(&report, &rows);
            Ok(())
        }
    }

    fn config(&self) -> anyhow::Result<ScanConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if self.max_account.is_some() {
            config.extract.max_account = self.max_account;
        }
        if self.debit_only {
            config.extract.debit_only = true;
        }
        if self.keep_non_investments {
            config.extract.skip_non_investments = false;
        }
        Ok(config)
    }

    fn print_report(&self, report: &Report, rows: &[ItemRow]) {
        if report.nothing_recognized() && report.payroll.is_empty() {
            println!("No transactions recognized");
            return;
        }

        if rows.is_empty() {
            println!("No eligible items found");
        } else {
            let table = Table::new(rows)
                .with(Style::rounded())
                .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
                .to_string();
            println!("{}", table);
        }

        if !report.payroll.is_empty() {
            let payroll = Table::new(report.payroll.iter().map(super::payroll::PayrollRow::from))
                .with(Style::rounded())
                .to_string();
            println!();
            println!("{}", payroll);
        }

        print_summary(report);
    }

    fn write_csv(&self, rows: &[ItemRow]) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn print_summary(report: &Report) {
    println!();
    println!("INCENTIVE SUMMARY");
    for (category, (invested, benefit)) in report.totals_by_category() {
        println!(
            "  {:<10} invested {:>14}   benefit {:>12}",
            category.label(),
            format_amount(invested),
            format_amount(benefit)
        );
    }
    if !report.payroll.is_empty() {
        println!(
            "  {:<10} {:>5} employees{:>25}",
            "Payroll",
            report.payroll.len(),
            format_amount(report.payroll_benefit())
        );
    }
    println!();
    println!("  Total estimated benefit: {}", format_amount(report.total_benefit));
    println!(
        "  {} ledger lines, {} skipped, {} duplicates collapsed, {} of {} candidates eligible",
        report.extraction.lines_found,
        report.extraction.skipped(),
        report.duplicates,
        report.eligible_count,
        report.item_count
    );
    if let Some(hash) = &report.source_sha256 {
        println!("  Source sha256: {}", hash);
    }
}

/// Row for the items table output
#[derive(Debug, Clone, Tabled, serde::Serialize)]
pub struct ItemRow {
    #[tabled(rename = "Category")]
    pub category: String,

    #[tabled(rename = "Account")]
    pub account: String,

    #[tabled(rename = "Description")]
    pub description: String,

    #[tabled(rename = "Amount")]
    pub amount: String,

    #[tabled(rename = "Rate")]
    pub rate: String,

    #[tabled(rename = "Benefit")]
    pub benefit: String,

    #[tabled(rename = "Vehicle")]
    pub vehicle: String,

    #[tabled(rename = "Rationale")]
    pub rationale: String,
}

impl From<&ReportItem> for ItemRow {
    fn from(item: &ReportItem) -> Self {
        let vehicle = item
            .vehicle
            .as_ref()
            .map(|v| format!("{} {}", v.plate, v.brand_model))
            .unwrap_or_default();
        ItemRow {
            category: item.category.label().to_string(),
            account: item.account_id.clone(),
            description: item.description.clone(),
            amount: format_amount(item.amount),
            rate: format_rate(item.rate),
            benefit: format_amount(item.benefit),
            vehicle,
            rationale: item.rationale.clone(),
        }
    }
}

fn format_rate(rate: Decimal) -> String {
    if rate.is_zero() {
        return "-".to_string();
    }
    format!("{}%", (rate * dec!(100)).normalize())
}

fn build_rows(report: &Report, all: bool) -> Vec<ItemRow> {
    report
        .items
        .iter()
        .filter(|item| all || item.category.is_eligible())
        .map(ItemRow::from)
        .collect()
}
