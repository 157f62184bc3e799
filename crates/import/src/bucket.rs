use std::collections::HashMap;

use ledger_core::{Entry, Money};

/// Entries can only reconcile with each other when their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    pub amount: Money,
    pub check_no: Option<String>,
}

impl BucketKey {
    pub fn of(entry: &Entry) -> Self {
        BucketKey {
            amount: entry.amount(),
            check_no: entry.check_no().map(str::to_string),
        }
    }

    pub fn has_check_no(&self) -> bool {
        self.check_no.is_some()
    }
}

/// Entries grouped by [`BucketKey`], each group ordered newest first.
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    groups: HashMap<BucketKey, Vec<Entry>>,
}

impl Buckets {
    /// Groups entries arriving in any order.
    pub fn sorted<I: IntoIterator<Item = Entry>>(entries: I) -> Self {
        let mut acc = BucketAccumulator::new();
        for entry in entries {
            acc.include(entry);
        }
        acc.finish()
    }

    pub fn get(&self, key: &BucketKey) -> Option<&[Entry]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&BucketKey, &mut Vec<Entry>)> {
        self.groups.iter_mut()
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of entries across all buckets.
    pub fn entry_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn into_entries(self) -> impl Iterator<Item = Entry> {
        self.groups.into_values().flatten()
    }
}

/// Streaming side of [`Buckets`]: entries are appended as they come, usually
/// from a date-descending query, and ordered once in [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct BucketAccumulator {
    groups: HashMap<BucketKey, Vec<Entry>>,
}

impl BucketAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(&mut self, entry: Entry) {
        self.groups.entry(BucketKey::of(&entry)).or_default().push(entry);
    }

    /// Stable sort, so entries on the same date keep their arrival order.
    pub fn finish(self) -> Buckets {
        let mut groups = self.groups;
        for group in groups.values_mut() {
            group.sort_by(|a, b| b.date.cmp(&a.date));
        }
        Buckets { groups }
    }
}

impl Extend<Entry> for BucketAccumulator {
    fn extend<T: IntoIterator<Item = Entry>>(&mut self, iter: T) {
        for entry in iter {
            self.include(entry);
        }
    }
}
