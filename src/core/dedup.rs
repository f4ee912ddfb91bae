use super::transaction::Transaction;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Transactions with unique `(description, amount)` keys, in first-seen order.
///
/// Double-entry exports book every event twice (debit and credit leg) with the
/// same description and amount; only one leg is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    candidates: Vec<Transaction>,
    duplicates: usize,
}

impl CandidateSet {
    pub fn as_slice(&self) -> &[Transaction] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of transactions collapsed into an earlier representative
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.candidates.iter()
    }

    pub fn into_vec(self) -> Vec<Transaction> {
        self.candidates
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Collapse transactions sharing description and amount.
///
/// Amounts compare by value, so `450.00` and `450` are the same key.
pub fn dedup<I>(transactions: I) -> CandidateSet
where
    I: IntoIterator<Item = Transaction>,
{
    let mut seen: HashSet<(String, Decimal)> = HashSet::new();
    let mut set = CandidateSet::default();

    for tx in transactions {
        if seen.insert((tx.description.clone(), tx.amount.normalize())) {
            set.candidates.push(tx);
        } else {
            set.duplicates += 1;
        }
    }

    log::debug!(
        "Deduplicated {} candidates ({} duplicates collapsed)",
        set.candidates.len(),
        set.duplicates
    );
    set
}
