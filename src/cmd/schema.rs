//! Schema command - print the JSON schema of the report or config file

use crate::core::{Report, ScanConfig};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Document to describe
    #[arg(value_enum, default_value = "report")]
    target: SchemaTarget,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaTarget {
    /// Output of `scan --json`
    Report,
    /// File accepted by `--config`
    Config,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let schema = match self.target {
            SchemaTarget::Report => schema_for!(Report),
            SchemaTarget::Config => schema_for!(ScanConfig),
        };
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }
}
