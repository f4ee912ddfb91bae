use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

/// Largest amount accepted on a single posting
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("no digits in amount: {0:?}")]
    NoDigits(String),
    #[error("invalid amount: {0:?}")]
    Invalid(String),
}

/// Parse a locale-ambiguous decimal string into a non-negative amount.
///
/// Both separators present means European notation (`1.652,07`): dots are
/// thousands separators and the comma is the decimal point. A lone comma is
/// the decimal point. A lone dot is left as is.
pub fn parse_amount(raw: &str) -> Result<Decimal, ParseError> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if !compact.chars().any(|c| c.is_ascii_digit()) {
        return Err(ParseError::NoDigits(raw.to_string()));
    }

    let normalized = match (compact.contains('.'), compact.contains(',')) {
        (true, true) => compact.replace('.', "").replace(',', "."),
        (false, true) => compact.replace(',', "."),
        _ => compact,
    };

    let amount = Decimal::from_str(&normalized)
        .map(|d| d.abs())
        .map_err(|_| ParseError::Invalid(raw.to_string()))?;
    if amount > MAX_AMOUNT {
        return Err(ParseError::Invalid(raw.to_string()));
    }
    Ok(amount)
}

/// Format an amount with two decimals, e.g. for table and CSV output.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}
