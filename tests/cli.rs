//! E2E tests for the scan, payroll and schema commands

use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Eligible items and totals for the sample export, without registry lookups
#[test]
fn scan_sample_offline() {
    let output = run(&["scan", "-f", "tests/data/sample.xaf", "--offline"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);

    assert!(stdout.contains("KIA"));
    assert!(stdout.contains("MIA/EIA"));
    assert!(stdout.contains("VAMIL"));
    assert!(stdout.contains("HP Laptop aanschaf"));
    assert!(stdout.contains("unverified vehicle AB-123-C"));
    assert!(stdout.contains("Total estimated benefit: 17869.00"));

    // Excluded and below-floor postings only show with --all
    assert!(!stdout.contains("Lease termijn auto"));
    assert!(!stdout.contains("Kantoorbenodigdheden"));
}

#[test]
fn scan_all_lists_excluded_postings() {
    let output = run(&["scan", "-f", "tests/data/sample.xaf", "--offline", "--all"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("EXCLUDED"));
    assert!(stdout.contains("Lease termijn auto"));
    assert!(stdout.contains("Verzekering bedrijfspand"));
    assert!(stdout.contains("Kantoorbenodigdheden"));

    // Opening balance and depreciation never reach the classifier
    assert!(!stdout.contains("Beginbalans"));
    assert!(!stdout.contains("Afschrijving"));
}

#[test]
fn scan_csv_output() {
    let output = run(&["scan", "-f", "tests/data/sample.xaf", "--offline", "--csv"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);

    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("category,account,description,amount,rate,benefit,vehicle,rationale")
    );
    assert_eq!(lines.count(), 4);
    assert!(stdout.contains("KIA,0100,HP Laptop aanschaf,1250.00,28%,350.00"));
}

#[test]
fn scan_json_report() {
    let output = run(&["scan", "-f", "tests/data/sample.xaf", "--offline", "--json"]);
    assert!(output.status.success(), "Command failed: {:?}", output);

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON report");

    assert_eq!(report["item_count"], 7);
    assert_eq!(report["eligible_count"], 4);
    assert_eq!(report["duplicates"], 1);
    assert_eq!(report["extraction"]["lines_found"], 11);
    assert_eq!(report["extraction"]["missing_amount"], 1);
    assert_eq!(report["extraction"]["filtered"], 2);
    assert_eq!(report["source_sha256"].as_str().map(str::len), Some(64));

    let total = report["total_benefit"].as_str().expect("decimal string");
    assert!(total.starts_with("17869.0"), "total {}", total);
}

#[test]
fn scan_with_config_override() {
    let output = run(&[
        "scan",
        "-f",
        "tests/data/sample.xaf",
        "--offline",
        "--config",
        "tests/data/config.json",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    // Laptop falls below the raised floor, the bus gets the lower rate
    assert!(!stdout.contains("HP Laptop aanschaf"));
    assert!(stdout.contains("8000.00"));
    assert!(stdout.contains("Total estimated benefit: 16559.00"));
}

#[test]
fn scan_with_payroll() {
    let output = run(&[
        "scan",
        "-f",
        "tests/data/sample.xaf",
        "--offline",
        "--payroll",
        "tests/data/payroll.csv",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("Jan Jansen"));
    assert!(stdout.contains("Jeugd-LIV"));
    assert!(stdout.contains("Total estimated benefit: 20869.00"));
}

#[test]
fn scan_empty_export() {
    let output = run(&["scan", "-f", "tests/data/empty.xaf", "--offline"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("No transactions recognized"));
}

#[test]
fn scan_missing_file_fails() {
    let output = run(&["scan", "-f", "tests/data/does_not_exist.xaf", "--offline"]);
    assert!(!output.status.success());
}

#[test]
fn payroll_sheet() {
    let output = run(&["payroll", "-f", "tests/data/payroll.csv"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("Jan Jansen"));
    assert!(stdout.contains("Sanne de Boer"));
    assert!(stdout.contains("LIV"));
    assert!(!stdout.contains("Piet Pieters"));
    assert!(stdout.contains("Total wage subsidies: 3000.00"));
}

#[test]
fn schema_for_report_and_config() {
    let output = run(&["schema", "report"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("total_benefit"));
    assert!(stdout.contains("SEBA+MIA"));

    let output = run(&["schema", "config"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("sustainable_rate"));
    assert!(stdout.contains("base_url"));
}

#[test]
fn scan_help_describes_account_ceiling() {
    let output = run(&["scan", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Command failed: {:?}", output);
    assert!(stdout.contains("at or above this number"));
}
