pub mod amount;
pub mod config;
pub mod dedup;
pub mod ledger;
pub mod payroll;
pub mod report;
pub mod rules;
pub mod scan;
pub mod transaction;
pub mod vehicle;
pub mod verdict;

// Flat public surface for domain types and functions.
pub use amount::format_amount;
pub use config::{RegistryConfig, ScanConfig};
pub use payroll::{assess_all, read_employees, PayrollIncentive};
pub use report::{Report, ReportItem};
pub use scan::scan;
pub use vehicle::{RegistryError, VehicleRegistry};
