//! Payroll command - wage subsidies for a payroll sheet

use crate::cmd::{load_config, read_input};
use crate::core::{assess_all, format_amount, read_employees, PayrollIncentive};
use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct PayrollCommand {
    /// CSV sheet with name, hourly wage and age columns, or "-" to read stdin
    #[arg(short, long)]
    file: PathBuf,

    /// JSON file overriding the wage bands
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output as CSV instead of formatted table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl PayrollCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let config = load_config(self.config.as_deref())?;
        let input = read_input(&self.file)?;
        let employees = read_employees(input.as_slice())
            .with_context(|| format!("cannot read payroll sheet {}", self.file.display()))?;
        let incentives = assess_all(&employees, &config.payroll);
        log::info!(
            "{} of {} employees qualify for a wage subsidy",
            incentives.len(),
            employees.len()
        );

        if self.json {
            println!("{}", serde_json::to_string_pretty(&incentives)?);
            return Ok(());
        }

        let rows: Vec<PayrollRow> = incentives.iter().map(PayrollRow::from).collect();
        if self.csv {
            let mut wtr = csv::Writer::from_writer(io::stdout());
            for row in &rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
            return Ok(());
        }

        if rows.is_empty() {
            println!("No eligible employees found");
            return Ok(());
        }

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);

        let total: Decimal = incentives.iter().map(|i| i.amount).sum();
        println!();
        println!("  Total wage subsidies: {}", format_amount(total));
        Ok(())
    }
}

/// Row for the payroll table output
#[derive(Debug, Clone, Tabled, serde::Serialize)]
pub struct PayrollRow {
    #[tabled(rename = "Name")]
    pub name: String,

    #[tabled(rename = "Subsidy")]
    pub subsidy: String,

    #[tabled(rename = "Hourly wage")]
    pub hourly_wage: String,

    #[tabled(rename = "Age")]
    pub age: u32,

    #[tabled(rename = "Amount")]
    pub amount: String,

    #[tabled(rename = "Rationale")]
    pub rationale: String,
}

impl From<&PayrollIncentive> for PayrollRow {
    fn from(incentive: &PayrollIncentive) -> Self {
        PayrollRow {
            name: incentive.name.clone(),
            subsidy: incentive.subsidy.label().to_string(),
            hourly_wage: format_amount(incentive.hourly_wage),
            age: incentive.age,
            amount: format_amount(incentive.amount),
            rationale: incentive.rationale.clone(),
        }
    }
}
