use std::collections::BTreeMap;

use ledger_core::{CatPayment, Entry, EntryId, ReviewStatus};
use serde::Serialize;

/// Bank-side data to fold into a matched ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Merge {
    name: String,
    cat_payment: CatPayment,
}

impl Merge {
    pub fn from_bank(entry: &Entry) -> Self {
        Merge {
            name: entry.name.clone(),
            cat_payment: entry.cat_payment.clone(),
        }
    }

    /// Applies the bank data to `existing` in place and reports whether
    /// anything changed.
    ///
    /// The entry always ends up reconciled under the bank entry's payment
    /// account. A reviewed entry changes in no other way. An unreviewed one
    /// takes the bank name, and also the bank categorization if it is still
    /// uncategorized.
    pub fn apply(&self, existing: &mut Entry) -> bool {
        let before = existing.clone();
        let account = self.cat_payment.payment;
        if existing.status == ReviewStatus::Reviewed {
            existing.cat_payment.reconcile(account);
        } else {
            existing.name.clone_from(&self.name);
            if existing.cat_payment.is_uncategorized() {
                existing.cat_payment = self.cat_payment.clone();
            }
            existing.cat_payment.reconcile(account);
        }
        *existing != before
    }
}

/// Operations for the persistence layer to apply in one transaction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeSet {
    pub adds: Vec<Entry>,
    pub updates: BTreeMap<EntryId, Merge>,
    /// Bank transaction ids consumed by this import.
    pub processed_fit_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub adds: usize,
    pub updates: usize,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.adds.len() + self.updates.len()
    }

    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            adds: self.adds.len(),
            updates: self.updates.len(),
        }
    }
}

/// Splits matched bank entries into new records and merges keyed by the
/// ledger id they matched.
pub fn changes<I: IntoIterator<Item = Entry>>(bank: I) -> ChangeSet {
    let mut set = ChangeSet::default();
    for entry in bank {
        match entry.id {
            None => set.adds.push(entry),
            Some(id) => {
                set.updates.insert(id, Merge::from_bank(&entry));
            }
        }
    }
    set
}
