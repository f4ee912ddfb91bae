//! Ordered classification cascade.
//!
//! Rules run in a fixed order and the first one with an outcome decides. The
//! exclusion list sits before every inclusion rule, and the sustainable
//! categories before the general tangible asset rule.

use super::config::ScanConfig;
use super::transaction::Transaction;
use super::verdict::{Category, RuleKind, Verdict};
use rust_decimal::Decimal;

pub const EXCLUSION_RATIONALE: &str = "classified as operating expense / non-asset correction";
pub const TANGIBLE_RATIONALE: &str = "tangible business asset";

/// Cost and financing vocabulary (lease, insurance, premium, interest,
/// correction, opening balance, payroll, turnover tax, corporate tax)
const EXCLUSION_TERMS: &[&str] = &[
    "lease",
    "leasing",
    "verzekering",
    "insurance",
    "premie",
    "premium",
    "rente",
    "interest",
    "correctie",
    "correction",
    "beginbalans",
    "openingsbalans",
    "opening balance",
    "salaris",
    "loon",
    "payroll",
    "salary",
    "omzetbelasting",
    "turnover tax",
    "vennootschapsbelasting",
    "corporate tax",
    "vpb",
];

/// Short exclusion terms only count at the start of a word ("release" is not
/// a lease, "leasetermijn" is)
const WORD_START_TERMS: &[&str] = &["lease", "leasing", "rente", "loon", "vpb"];

const SUSTAINABLE_VEHICLE_TERMS: &[&str] = &[
    "tesla",
    "polestar",
    "elektrische auto",
    "elektrische bestel",
    "elektrische vracht",
    "electric vehicle",
    "e-auto",
];

const SUSTAINABLE_TERMS: &[&str] = &[
    "elektrisch",
    "zonnepaneel",
    "zonnepanelen",
    "zonne-energie",
    "zonneboiler",
    "solar",
    "laadpaal",
    "laadstation",
    "laadpunt",
    "charging",
    "warmtepomp",
    "heat pump",
    "accu",
    "thuisbatterij",
    "isolatie",
    "insulation",
];

const TANGIBLE_TERMS: &[&str] = &[
    "hp",
    "computer",
    "laptop",
    "pc",
    "machine",
    "server",
    "monitor",
    "printer",
    "inventaris",
    "apparatuur",
    "gereedschap",
    "meubilair",
    "hardware",
    "equipment",
    "tooling",
];

/// Result of a single rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Excluded { rationale: String },
    Matched {
        category: Category,
        rate: Decimal,
        rationale: String,
    },
    NoMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    StatutoryFloor,
    Exclusion,
    Sustainable,
    TangibleAsset,
}

impl Rule {
    /// The cascade, in evaluation order
    pub const CASCADE: [Rule; 4] = [
        Rule::StatutoryFloor,
        Rule::Exclusion,
        Rule::Sustainable,
        Rule::TangibleAsset,
    ];

    pub fn kind(self) -> RuleKind {
        match self {
            Rule::StatutoryFloor => RuleKind::StatutoryFloor,
            Rule::Exclusion => RuleKind::Exclusion,
            Rule::Sustainable => RuleKind::Sustainable,
            Rule::TangibleAsset => RuleKind::TangibleAsset,
        }
    }

    pub fn apply(self, tx: &Transaction, config: &ScanConfig) -> RuleOutcome {
        let desc = tx.description.to_lowercase();
        match self {
            Rule::StatutoryFloor => {
                if tx.amount < config.floor {
                    RuleOutcome::Matched {
                        category: Category::None,
                        rate: Decimal::ZERO,
                        rationale: format!("below the minimum investment of {} per asset", config.floor),
                    }
                } else {
                    RuleOutcome::NoMatch
                }
            }
            Rule::Exclusion => match find_exclusion(&desc) {
                Some(term) => RuleOutcome::Excluded {
                    rationale: format!("{EXCLUSION_RATIONALE} (matched '{term}')"),
                },
                None => RuleOutcome::NoMatch,
            },
            Rule::Sustainable => {
                if tx.amount <= config.sustainable_min_amount {
                    return RuleOutcome::NoMatch;
                }
                let (category, term) = if let Some(term) = find_term(&desc, SUSTAINABLE_VEHICLE_TERMS) {
                    (Category::Vamil, term)
                } else if let Some(term) = find_term(&desc, SUSTAINABLE_TERMS) {
                    (Category::MiaEia, term)
                } else {
                    return RuleOutcome::NoMatch;
                };
                RuleOutcome::Matched {
                    category,
                    rate: config.sustainable_rate,
                    rationale: format!("sustainable investment signal '{term}'"),
                }
            }
            Rule::TangibleAsset => {
                if config.general_max_amount.is_some_and(|max| tx.amount >= max) {
                    return RuleOutcome::NoMatch;
                }
                let in_asset_range = tx
                    .account_number()
                    .is_some_and(|n| config.tangible_accounts.contains(n));
                if in_asset_range || find_term(&desc, TANGIBLE_TERMS).is_some() {
                    RuleOutcome::Matched {
                        category: Category::Kia,
                        rate: config.general_rate,
                        rationale: TANGIBLE_RATIONALE.to_string(),
                    }
                } else {
                    RuleOutcome::NoMatch
                }
            }
        }
    }
}

fn find_term(haystack: &str, terms: &[&'static str]) -> Option<&'static str> {
    terms.iter().copied().find(|term| haystack.contains(term))
}

fn find_exclusion(haystack: &str) -> Option<&'static str> {
    EXCLUSION_TERMS.iter().copied().find(|term| {
        if WORD_START_TERMS.contains(term) {
            starts_word(haystack, term)
        } else {
            haystack.contains(term)
        }
    })
}

fn starts_word(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(index, _)| {
        haystack[..index]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

/// Applies the cascade to candidate transactions
#[derive(Debug, Clone)]
pub struct RuleEngine {
    config: ScanConfig,
    rules: Vec<Rule>,
}

impl RuleEngine {
    pub fn new(config: ScanConfig) -> Self {
        RuleEngine {
            config,
            rules: Rule::CASCADE.to_vec(),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn classify<'a>(&self, tx: &'a Transaction) -> Verdict<'a> {
        for rule in &self.rules {
            let (category, rate, rationale) = match rule.apply(tx, &self.config) {
                RuleOutcome::NoMatch => continue,
                RuleOutcome::Excluded { rationale } => (Category::Excluded, Decimal::ZERO, rationale),
                RuleOutcome::Matched {
                    category,
                    rate,
                    rationale,
                } => (category, rate, rationale),
            };
            log::debug!(
                "{:?} -> {} by {:?}: {}",
                tx.description,
                category,
                rule,
                rationale
            );
            return Verdict {
                category,
                rate,
                rationale,
                ..Verdict::none(tx, rule.kind(), "")
            };
        }

        Verdict::none(tx, RuleKind::NoMatch, "no incentive category matched")
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}
