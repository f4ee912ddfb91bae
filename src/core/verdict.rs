use super::transaction::Transaction;
use super::vehicle::VehicleRecord;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Investment incentive category assigned to a posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Category {
    /// Kleinschaligheidsinvesteringsaftrek
    #[serde(rename = "KIA")]
    Kia,
    /// Milieu- or energie-investeringsaftrek
    #[serde(rename = "MIA/EIA")]
    MiaEia,
    /// Willekeurige afschrijving milieu-investeringen
    #[serde(rename = "VAMIL")]
    Vamil,
    /// Electric vehicle subsidy combined with MIA
    #[serde(rename = "SEBA+MIA")]
    SebaMia,
    #[serde(rename = "EXCLUDED")]
    Excluded,
    #[serde(rename = "NONE")]
    None,
}

impl Category {
    pub fn is_eligible(self) -> bool {
        !matches!(self, Category::Excluded | Category::None)
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Kia => "KIA",
            Category::MiaEia => "MIA/EIA",
            Category::Vamil => "VAMIL",
            Category::SebaMia => "SEBA+MIA",
            Category::Excluded => "EXCLUDED",
            Category::None => "NONE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stage of the pipeline that decided a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RuleKind {
    StatutoryFloor,
    Exclusion,
    Sustainable,
    TangibleAsset,
    NoMatch,
    VehicleRegistry,
}

/// Classification of one candidate transaction
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict<'a> {
    pub transaction: &'a Transaction,
    pub category: Category,
    pub rate: Decimal,
    /// Fixed subsidy on top of the rate based benefit (vehicles only)
    pub bonus: Decimal,
    pub rationale: String,
    pub rule: RuleKind,
    pub vehicle: Option<VehicleRecord>,
}

impl<'a> Verdict<'a> {
    pub fn none(transaction: &'a Transaction, rule: RuleKind, rationale: impl Into<String>) -> Self {
        Verdict {
            transaction,
            category: Category::None,
            rate: Decimal::ZERO,
            bonus: Decimal::ZERO,
            rationale: rationale.into(),
            rule,
            vehicle: None,
        }
    }

    /// `amount * rate + bonus`, saturating; always zero for ineligible categories
    pub fn benefit(&self) -> Decimal {
        if !self.category.is_eligible() {
            return Decimal::ZERO;
        }
        self.transaction
            .amount
            .saturating_mul(self.rate)
            .saturating_add(self.bonus)
    }

    /// Whether the cascade stopped before any inclusion rule
    pub fn is_final(&self) -> bool {
        matches!(self.rule, RuleKind::StatutoryFloor | RuleKind::Exclusion)
    }
}
