//! Wage subsidy lookup for a payroll sheet (LIV and Jeugd-LIV).
//!
//! Each employee row is checked against fixed wage and age bands; the amounts
//! are simplified yearly figures.

use super::amount::parse_amount;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PayrollConfig {
    /// Lowest hourly wage qualifying for LIV
    #[schemars(with = "f64")]
    pub liv_min_wage: Decimal,
    /// Highest hourly wage qualifying for LIV
    #[schemars(with = "f64")]
    pub liv_max_wage: Decimal,
    #[schemars(with = "f64")]
    pub liv_amount: Decimal,
    pub liv_min_age: u32,
    /// Highest hourly wage qualifying for Jeugd-LIV
    #[schemars(with = "f64")]
    pub youth_max_wage: Decimal,
    #[schemars(with = "f64")]
    pub youth_amount: Decimal,
    pub youth_min_age: u32,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        PayrollConfig {
            liv_min_wage: dec!(13.27),
            liv_max_wage: dec!(16.59),
            liv_amount: dec!(2000),
            liv_min_age: 21,
            youth_max_wage: dec!(13.27),
            youth_amount: dec!(1000),
            youth_min_age: 18,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum WageSubsidy {
    #[serde(rename = "LIV")]
    Liv,
    #[serde(rename = "Jeugd-LIV")]
    JeugdLiv,
}

impl WageSubsidy {
    pub fn label(self) -> &'static str {
        match self {
            WageSubsidy::Liv => "LIV",
            WageSubsidy::JeugdLiv => "Jeugd-LIV",
        }
    }
}

/// One row of the payroll sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub name: String,
    pub hourly_wage: Decimal,
    pub age: u32,
}

/// Cash incentive for one employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PayrollIncentive {
    pub name: String,
    pub subsidy: WageSubsidy,
    #[schemars(with = "f64")]
    pub hourly_wage: Decimal,
    pub age: u32,
    #[schemars(with = "f64")]
    pub amount: Decimal,
    pub rationale: String,
}

#[derive(Debug, Deserialize)]
struct PayrollRecord {
    #[serde(alias = "naam", alias = "Naam", alias = "Name")]
    name: String,
    #[serde(alias = "uurloon", alias = "Uurloon", alias = "Hourly wage")]
    hourly_wage: String,
    #[serde(alias = "leeftijd", alias = "Leeftijd", alias = "Age")]
    age: String,
}

impl TryFrom<PayrollRecord> for Employee {
    type Error = String;

    fn try_from(record: PayrollRecord) -> Result<Self, Self::Error> {
        let hourly_wage = parse_amount(&record.hourly_wage).map_err(|e| e.to_string())?;
        let age = record
            .age
            .trim()
            .parse()
            .map_err(|_| format!("invalid age {:?}", record.age))?;
        Ok(Employee {
            name: record.name.trim().to_string(),
            hourly_wage,
            age,
        })
    }
}

/// Read employees from a CSV sheet (comma or semicolon separated).
///
/// Rows that cannot be read are logged and skipped; a missing header is an error.
pub fn read_employees<R: Read>(mut reader: R) -> Result<Vec<Employee>, csv::Error> {
    let mut content = Vec::new();
    reader.read_to_end(&mut content)?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(&content))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_slice());

    // Fail early when the required columns are missing
    let headers = rdr.headers()?.clone();
    let mut employees = Vec::new();

    for (row, result) in rdr.deserialize::<PayrollRecord>().enumerate() {
        let parsed = result
            .map_err(|e| e.to_string())
            .and_then(Employee::try_from);
        match parsed {
            Ok(employee) => employees.push(employee),
            Err(err) => log::warn!("Skipping payroll row {}: {} (columns {:?})", row + 1, err, headers),
        }
    }

    log::info!("Read {} payroll records", employees.len());
    Ok(employees)
}

fn sniff_delimiter(content: &[u8]) -> u8 {
    let first_line = content.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Wage subsidy for one employee, if any band applies
pub fn assess(employee: &Employee, config: &PayrollConfig) -> Option<PayrollIncentive> {
    let wage = employee.hourly_wage;
    let (subsidy, amount, rationale) = if employee.age >= config.liv_min_age
        && wage >= config.liv_min_wage
        && wage <= config.liv_max_wage
    {
        (
            WageSubsidy::Liv,
            config.liv_amount,
            format!(
                "hourly wage {} within {}-{} band",
                wage, config.liv_min_wage, config.liv_max_wage
            ),
        )
    } else if employee.age >= config.youth_min_age
        && employee.age < config.liv_min_age
        && wage <= config.youth_max_wage
    {
        (
            WageSubsidy::JeugdLiv,
            config.youth_amount,
            format!("age {} with hourly wage up to {}", employee.age, config.youth_max_wage),
        )
    } else {
        return None;
    };

    Some(PayrollIncentive {
        name: employee.name.clone(),
        subsidy,
        hourly_wage: wage,
        age: employee.age,
        amount,
        rationale,
    })
}

pub fn assess_all(employees: &[Employee], config: &PayrollConfig) -> Vec<PayrollIncentive> {
    employees
        .iter()
        .filter_map(|employee| assess(employee, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(name: &str, wage: Decimal, age: u32) -> Employee {
        Employee {
            name: name.to_string(),
            hourly_wage: wage,
            age,
        }
    }

    #[test]
    fn liv_band() {
        let config = PayrollConfig::default();
        let incentive = assess(&employee("Jan", dec!(14.50), 34), &config).unwrap();
        assert_eq!(incentive.subsidy, WageSubsidy::Liv);
        assert_eq!(incentive.amount, dec!(2000));

        assert!(assess(&employee("Piet", dec!(22), 34), &config).is_none());
        assert!(assess(&employee("Kees", dec!(12), 34), &config).is_none());
    }

    #[test]
    fn youth_band() {
        let config = PayrollConfig::default();
        let incentive = assess(&employee("Sanne", dec!(10.25), 19), &config).unwrap();
        assert_eq!(incentive.subsidy, WageSubsidy::JeugdLiv);
        assert_eq!(incentive.amount, dec!(1000));

        assert!(assess(&employee("Tim", dec!(10.25), 17), &config).is_none());
    }

    #[test]
    fn reads_dutch_semicolon_sheet() {
        let csv = "naam;uurloon;leeftijd\nJan;14,50;34\nSanne;10,25;19\nFout;abc;40\n";
        let employees = read_employees(csv.as_bytes()).unwrap();
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[0].hourly_wage, dec!(14.50));
        assert_eq!(employees[1].age, 19);

        let incentives = assess_all(&employees, &PayrollConfig::default());
        assert_eq!(incentives.len(), 2);
    }

    #[test]
    fn reads_english_comma_sheet() {
        let csv = "name,hourly_wage,age\nAlex,15.00,40\n";
        let employees = read_employees(csv.as_bytes()).unwrap();
        assert_eq!(employees, vec![employee("Alex", dec!(15), 40)]);
    }

    #[test]
    fn empty_sheet_has_no_employees() {
        assert!(read_employees("".as_bytes()).unwrap().is_empty());
    }
}
