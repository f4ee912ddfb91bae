pub mod payroll;
pub mod scan;
pub mod schema;

use crate::core::ScanConfig;
use anyhow::Context;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read the whole input file into memory (or stdin with "-")
pub fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if path.as_os_str() == "-" {
        let stdin = io::stdin();
        BufReader::new(stdin.lock()).read_to_end(&mut buffer)?;
    } else {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        BufReader::new(file).read_to_end(&mut buffer)?;
    }
    log::debug!("Read {} bytes from {}", buffer.len(), path.display());
    Ok(buffer)
}

/// Built-in defaults, or a JSON override file
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ScanConfig> {
    match path {
        Some(path) => ScanConfig::from_file(path)
            .with_context(|| format!("cannot load config {}", path.display())),
        None => Ok(ScanConfig::default()),
    }
}
