//! Tolerant extraction of posting lines from XAF audit files.
//!
//! Lines are discovered by their element markers and each field is picked out
//! independently, so partially conformant exports from different bookkeeping
//! packages still yield transactions. Nothing here fails: input that cannot be
//! read simply produces no lines.

use super::amount::{parse_amount, ParseError};
use super::transaction::{Direction, Transaction, UNKNOWN_DESCRIPTION};
use chrono::NaiveDate;
use encoding_rs::WINDOWS_1252;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Description fragments of postings that never represent a new investment
const NON_INVESTMENT_MARKERS: &[&str] = &[
    "beginbalans",
    "openingsbalans",
    "opening balance",
    "afschrijving",
    "afschr.",
    "depreciation",
];

/// Filters applied while extracting lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractOptions {
    /// Keep only numeric account ids strictly below this ceiling
    pub max_account: Option<u32>,
    /// Drop lines explicitly booked as credit
    pub debit_only: bool,
    /// Drop opening balance and depreciation postings
    pub skip_non_investments: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            max_account: None,
            debit_only: false,
            skip_non_investments: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterReason {
    AccountCeiling,
    CreditPosting,
    NonInvestment,
}

/// Why a discovered line did not become a transaction
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LineError {
    #[error("line has no account id")]
    MissingAccount,
    #[error("line has no amount")]
    MissingAmount,
    #[error(transparent)]
    InvalidAmount(#[from] ParseError),
    #[error("line filtered: {0:?}")]
    Filtered(FilterReason),
}

/// Extraction diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractStats {
    pub lines_found: usize,
    pub emitted: usize,
    pub missing_account: usize,
    pub missing_amount: usize,
    pub invalid_amount: usize,
    pub filtered: usize,
}

impl ExtractStats {
    pub fn skipped(&self) -> usize {
        self.lines_found - self.emitted
    }
}

/// Decoded ledger export.
///
/// Holds the decoded text so [`Ledger::transactions`] can be iterated any number
/// of times without decoding again.
#[derive(Debug, Clone)]
pub struct Ledger {
    text: String,
    options: ExtractOptions,
}

impl Ledger {
    pub fn from_bytes(bytes: &[u8], options: ExtractOptions) -> Self {
        Ledger {
            text: decode(bytes),
            options,
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Every discovered line, parsed or with the reason it was dropped
    pub fn parse_lines(&self) -> impl Iterator<Item = Result<Transaction, LineError>> + '_ {
        line_re()
            .captures_iter(&self.text)
            .filter_map(|caps| caps.get(1))
            .map(move |body| self.parse_line(body.as_str()))
    }

    /// Recognised transactions, in document order
    pub fn transactions(&self) -> impl Iterator<Item = Transaction> + '_ {
        self.parse_lines().filter_map(Result::ok)
    }

    pub fn stats(&self) -> ExtractStats {
        self.parse_lines()
            .fold(ExtractStats::default(), |mut stats, line| {
                stats.lines_found += 1;
                match line {
                    Ok(_) => stats.emitted += 1,
                    Err(LineError::MissingAccount) => stats.missing_account += 1,
                    Err(LineError::MissingAmount) => stats.missing_amount += 1,
                    Err(LineError::InvalidAmount(_)) => stats.invalid_amount += 1,
                    Err(LineError::Filtered(_)) => stats.filtered += 1,
                }
                stats
            })
    }

    fn parse_line(&self, body: &str) -> Result<Transaction, LineError> {
        let account_id = account_re()
            .captures(body)
            .map(|caps| text(&caps, 1))
            .ok_or(LineError::MissingAccount)?;

        let (amount, amount_direction) = extract_amount(body)?;

        let description = description_re()
            .captures(body)
            .map(|caps| text(&caps, 1))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| UNKNOWN_DESCRIPTION.to_string());

        let direction = amount_type_re()
            .captures(body)
            .and_then(|caps| Direction::from_code(&text(&caps, 1)))
            .or(amount_direction);

        let date = date_re()
            .captures(body)
            .and_then(|caps| NaiveDate::parse_from_str(&text(&caps, 1), "%Y-%m-%d").ok());

        let tx = Transaction {
            account_id,
            description,
            amount,
            direction,
            date,
        };

        match self.filter_reason(&tx) {
            Some(reason) => {
                log::debug!("Skipping {:?}: {:?}", tx.description, reason);
                Err(LineError::Filtered(reason))
            }
            None => Ok(tx),
        }
    }

    fn filter_reason(&self, tx: &Transaction) -> Option<FilterReason> {
        if let Some(ceiling) = self.options.max_account {
            if !tx.account_number().is_some_and(|n| n < ceiling) {
                return Some(FilterReason::AccountCeiling);
            }
        }
        if self.options.debit_only && tx.direction == Some(Direction::Credit) {
            return Some(FilterReason::CreditPosting);
        }
        if self.options.skip_non_investments {
            let desc = tx.description.to_lowercase();
            if NON_INVESTMENT_MARKERS.iter().any(|m| desc.contains(m)) {
                return Some(FilterReason::NonInvestment);
            }
        }
        None
    }
}

/// Decode export bytes as Windows-1252.
///
/// The XML declaration is ignored since exports often misstate it; only a
/// UTF-8 or UTF-16 byte order mark switches the decoder. Undecodable bytes are
/// replaced.
pub fn decode(bytes: &[u8]) -> String {
    let (text, actual, had_errors) = WINDOWS_1252.decode(bytes);
    if had_errors {
        log::warn!("Replaced undecodable bytes while reading {} input", actual.name());
    }
    text.into_owned()
}

/// First amount tag with a non-zero value wins, so XAF 2 lines carrying both a
/// zero `debitAmount` and a filled `creditAmount` resolve to the credit leg.
fn extract_amount(body: &str) -> Result<(Decimal, Option<Direction>), LineError> {
    let mut first: Option<Result<(Decimal, Option<Direction>), ParseError>> = None;

    for caps in amount_re().captures_iter(body) {
        let direction = match &caps[1] {
            "debitAmount" => Some(Direction::Debit),
            "creditAmount" => Some(Direction::Credit),
            _ => None,
        };
        let parsed = parse_amount(&text(&caps, 2)).map(|amount| (amount, direction));
        if matches!(parsed, Ok((amount, _)) if !amount.is_zero()) {
            return parsed.map_err(LineError::from);
        }
        first.get_or_insert(parsed);
    }

    match first {
        Some(parsed) => parsed.map_err(LineError::from),
        None => Err(LineError::MissingAmount),
    }
}

fn text(caps: &Captures, group: usize) -> String {
    caps.get(group)
        .map(|m| unescape(m.as_str().trim()))
        .unwrap_or_default()
}

/// Resolve the predefined XML entities and numeric character references
pub fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    entity_re()
        .replace_all(raw, |caps: &Captures| {
            let name = &caps[1];
            let resolved = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => name
                    .strip_prefix("#x")
                    .or_else(|| name.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16).ok())
                    .unwrap_or_else(|| name.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            resolved.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?s)<(?:[\w.-]+:)?(?:trLine|transactionLine|line)\b[^>]*>(.*?)</(?:[\w.-]+:)?(?:trLine|transactionLine|line)\s*>",
        )
        .expect("invalid line regex")
    })
}

fn account_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(?:[\w.-]+:)?(?:accID|accountID)\b[^>]*>([^<]*)<")
            .expect("invalid account regex")
    })
}

fn description_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(?:[\w.-]+:)?(?:desc|description)\b[^>]*>([^<]*)<")
            .expect("invalid description regex")
    })
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(?:[\w.-]+:)?(amnt|amount|debitAmount|creditAmount)\b[^>]*>([^<]*)<")
            .expect("invalid amount regex")
    })
}

fn amount_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(?:[\w.-]+:)?amntTp\b[^>]*>([^<]*)<").expect("invalid amntTp regex")
    })
}

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<(?:[\w.-]+:)?(?:effDate|trDt)\b[^>]*>([^<]*)<").expect("invalid date regex")
    })
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("invalid entity regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const XAF_32: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<auditfile xmlns="http://www.auditfiles.nl/XAF/3.2">
  <company>
    <transactions>
      <journal>
        <transaction>
          <nr>1</nr>
          <trLine>
            <nr>1</nr>
            <accID>0100</accID>
            <effDate>2024-03-01</effDate>
            <desc>HP Laptop aanschaf</desc>
            <amnt>900.00</amnt>
            <amntTp>D</amntTp>
            <vat><vatAmnt>189.00</vatAmnt></vat>
          </trLine>
          <trLine>
            <nr>2</nr>
            <accID>1600</accID>
            <desc>HP Laptop aanschaf</desc>
            <amnt>900.00</amnt>
            <amntTp>C</amntTp>
          </trLine>
        </transaction>
      </journal>
    </transactions>
  </company>
</auditfile>"#;

    fn ledger(xml: &str) -> Ledger {
        Ledger::from_bytes(xml.as_bytes(), ExtractOptions::default())
    }

    #[test]
    fn extracts_xaf_32_lines() {
        let txs: Vec<_> = ledger(XAF_32).transactions().collect();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].account_id, "0100");
        assert_eq!(txs[0].description, "HP Laptop aanschaf");
        assert_eq!(txs[0].amount, dec!(900));
        assert_eq!(txs[0].direction, Some(Direction::Debit));
        assert_eq!(txs[0].date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(txs[1].direction, Some(Direction::Credit));
    }

    #[test]
    fn transactions_can_be_iterated_again() {
        let ledger = ledger(XAF_32);
        assert_eq!(ledger.transactions().count(), 2);
        assert_eq!(ledger.transactions().count(), 2);
    }

    #[test]
    fn namespace_prefixes_and_european_amounts() {
        let xml = r#"<xaf:auditfile xmlns:xaf="urn:x">
            <xaf:trLine><xaf:accID>120</xaf:accID><xaf:desc>Warmtepomp</xaf:desc>
            <xaf:amnt>1.652,07</xaf:amnt></xaf:trLine></xaf:auditfile>"#;
        let txs: Vec<_> = ledger(xml).transactions().collect();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].amount, dec!(1652.07));
        assert_eq!(txs[0].direction, None);
    }

    #[test]
    fn xaf_2_debit_and_credit_amount_tags() {
        let xml = r#"<auditfile><line><accountID>100</accountID>
            <description>Server</description><debitAmount>0</debitAmount>
            <creditAmount>2500,00</creditAmount></line>
            <line><accountID>100</accountID><description>Monitor</description>
            <debitAmount>450</debitAmount></line></auditfile>"#;
        let txs: Vec<_> = ledger(xml).transactions().collect();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].amount, dec!(2500));
        assert_eq!(txs[0].direction, Some(Direction::Credit));
        assert_eq!(txs[1].direction, Some(Direction::Debit));
    }

    #[test]
    fn missing_description_gets_placeholder() {
        let xml = "<trLine><accID>100</accID><amnt>10</amnt></trLine>\
                   <trLine><accID>100</accID><desc/><amnt>11</amnt></trLine>";
        let txs: Vec<_> = ledger(xml).transactions().collect();
        assert_eq!(txs.len(), 2);
        assert!(txs.iter().all(|t| t.description == UNKNOWN_DESCRIPTION));
    }

    #[test]
    fn lines_without_account_or_amount_are_skipped() {
        let xml = "<trLine><desc>a</desc><amnt>10</amnt></trLine>\
                   <trLine><accID>100</accID><desc>b</desc></trLine>\
                   <trLine><accID>100</accID><desc>c</desc><amnt>tien</amnt></trLine>\
                   <trLine><accID>100</accID><desc>d</desc><amnt>10</amnt></trLine>";
        let ledger = ledger(xml);
        let txs: Vec<_> = ledger.transactions().collect();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].description, "d");

        let stats = ledger.stats();
        assert_eq!(stats.lines_found, 4);
        assert_eq!(stats.emitted, 1);
        assert_eq!(stats.missing_account, 1);
        assert_eq!(stats.missing_amount, 1);
        assert_eq!(stats.invalid_amount, 1);
        assert_eq!(stats.skipped(), 3);
    }

    #[test]
    fn empty_and_garbage_input_yield_nothing() {
        assert_eq!(ledger("").transactions().count(), 0);
        assert_eq!(ledger("not xml at all").transactions().count(), 0);
        let garbage = Ledger::from_bytes(&[0xff, 0x00, 0x81, 0x3c], ExtractOptions::default());
        assert_eq!(garbage.transactions().count(), 0);
    }

    #[test]
    fn windows_1252_descriptions_are_decoded() {
        let mut bytes = b"<trLine><accID>100</accID><desc>Caf".to_vec();
        bytes.push(0xe9);
        bytes.extend_from_slice(b" inventaris</desc><amnt>600</amnt></trLine>");
        let txs: Vec<_> = Ledger::from_bytes(&bytes, ExtractOptions::default())
            .transactions()
            .collect();
        assert_eq!(txs[0].description, "Café inventaris");
    }

    #[test]
    fn declared_encoding_is_not_trusted() {
        let mut bytes = br#"<?xml version="1.0" encoding="UTF-8"?><trLine><accID>100</accID><desc>Caf"#.to_vec();
        bytes.push(0xe9);
        bytes.extend_from_slice(b" inventaris</desc><amnt>600</amnt></trLine>");
        let txs: Vec<_> = Ledger::from_bytes(&bytes, ExtractOptions::default())
            .transactions()
            .collect();
        assert_eq!(txs[0].description, "Café inventaris");

        let xml = r#"<?xml version="1.0" encoding="UTF-16"?>
            <trLine><accID>100</accID><desc>Laptop</desc><amnt>900</amnt></trLine>"#;
        assert_eq!(ledger(xml).transactions().count(), 1);
    }

    #[test]
    fn byte_order_mark_selects_utf8() {
        let mut bytes = vec![0xef, 0xbb, 0xbf];
        bytes.extend_from_slice("<trLine><accID>100</accID><desc>Café</desc><amnt>600</amnt></trLine>".as_bytes());
        let txs: Vec<_> = Ledger::from_bytes(&bytes, ExtractOptions::default())
            .transactions()
            .collect();
        assert_eq!(txs[0].description, "Café");
    }

    #[test]
    fn entities_are_unescaped() {
        assert_eq!(unescape("Smit &amp; Zn"), "Smit & Zn");
        assert_eq!(unescape("&#233;&#xE9;"), "éé");
        assert_eq!(unescape("&bogus;"), "&bogus;");
    }

    #[test]
    fn account_ceiling_filter() {
        let options = ExtractOptions {
            max_account: Some(1000),
            ..ExtractOptions::default()
        };
        let txs: Vec<_> = Ledger::from_bytes(XAF_32.as_bytes(), options)
            .transactions()
            .collect();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].account_id, "0100");
    }

    #[test]
    fn account_ceiling_itself_is_dropped() {
        let xml = "<trLine><accID>999</accID><desc>a</desc><amnt>10</amnt></trLine>\
                   <trLine><accID>1000</accID><desc>b</desc><amnt>10</amnt></trLine>";
        let options = ExtractOptions {
            max_account: Some(1000),
            ..ExtractOptions::default()
        };
        let txs: Vec<_> = Ledger::from_bytes(xml.as_bytes(), options)
            .transactions()
            .collect();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].account_id, "999");
    }

    #[test]
    fn debit_only_filter_keeps_lines_without_direction() {
        let xml = "<trLine><accID>100</accID><desc>a</desc><amnt>10</amnt><amntTp>C</amntTp></trLine>\
                   <trLine><accID>100</accID><desc>b</desc><amnt>10</amnt></trLine>";
        let options = ExtractOptions {
            debit_only: true,
            ..ExtractOptions::default()
        };
        let txs: Vec<_> = Ledger::from_bytes(xml.as_bytes(), options)
            .transactions()
            .collect();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].description, "b");
    }

    #[test]
    fn opening_balance_and_depreciation_are_dropped_by_default() {
        let xml = "<trLine><accID>100</accID><desc>Beginbalans 2024</desc><amnt>5000</amnt></trLine>\
                   <trLine><accID>100</accID><desc>Afschrijving laptop</desc><amnt>300</amnt></trLine>\
                   <trLine><accID>100</accID><desc>Laptop</desc><amnt>900</amnt></trLine>";
        assert_eq!(ledger(xml).transactions().count(), 1);

        let keep_all = ExtractOptions {
            skip_non_investments: false,
            ..ExtractOptions::default()
        };
        let all = Ledger::from_bytes(xml.as_bytes(), keep_all);
        assert_eq!(all.transactions().count(), 3);
    }
}
