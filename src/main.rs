mod cmd;
mod core;
mod registry;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "invscan",
    version,
    about = "Scan XAF ledger exports for Dutch investment incentives"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify ledger postings and estimate incentive benefits
    Scan(cmd::scan::ScanCommand),
    /// Check a payroll sheet for LIV and Jeugd-LIV wage subsidies
    Payroll(cmd::payroll::PayrollCommand),
    /// Print the JSON schema of the report or the config file
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Scan(scan) => scan.exec(),
        Command::Payroll(payroll) => payroll.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
