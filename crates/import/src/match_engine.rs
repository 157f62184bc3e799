use chrono::NaiveDate;
use ledger_core::Entry;

use crate::bucket::{BucketKey, Buckets};

/// How far apart a bank entry and an existing entry may be dated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// A shared check number is enough evidence on its own.
    Unbounded,
    Days(i64),
}

impl DateWindow {
    pub fn for_key(key: &BucketKey, max_days: i64) -> Self {
        if key.has_check_no() {
            DateWindow::Unbounded
        } else {
            DateWindow::Days(max_days)
        }
    }

    /// The bank side can never be dated before the ledger side.
    pub fn allows(self, bank: NaiveDate, existing: NaiveDate) -> bool {
        if bank < existing {
            return false;
        }
        match self {
            DateWindow::Unbounded => true,
            DateWindow::Days(max) => (bank - existing).num_days() <= max,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub matched: usize,
    pub unmatched: usize,
    /// Forward-pass matches the backward pass moved or dropped.
    pub demoted: usize,
}

impl MatchStats {
    fn absorb(&mut self, other: MatchStats) {
        self.matched += other.matched;
        self.unmatched += other.unmatched;
        self.demoted += other.demoted;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkState {
    Unvisited,
    Tentative(usize),
    Confirmed(usize),
    Rejected,
}

/// Links each bank entry of one bucket to at most one existing entry.
///
/// Both slices must be ordered newest first. Every bank id is cleared and then
/// set to the id of its matched existing entry; entries left at `None` are
/// new. Matches never share an existing entry and never cross.
pub fn reconcile(bank: &mut [Entry], existing: &[Entry], window: DateWindow) -> MatchStats {
    debug_assert!(is_newest_first(bank) && is_newest_first(existing));

    for entry in bank.iter_mut() {
        entry.id = None;
    }

    let mut states = vec![LinkState::Unvisited; bank.len()];
    let mut owner: Vec<Option<usize>> = vec![None; existing.len()];

    // Forward pass, newest to oldest. An existing entry newer than the current
    // bank entry cannot match it or anything older, so it is skipped; a bank
    // entry outside the window gives up without consuming the existing entry.
    let (mut i, mut j) = (0, 0);
    while i < bank.len() && j < existing.len() {
        if bank[i].date < existing[j].date {
            j += 1;
        } else if window.allows(bank[i].date, existing[j].date) {
            states[i] = LinkState::Tentative(j);
            owner[j] = Some(i);
            i += 1;
            j += 1;
        } else {
            i += 1;
        }
    }

    // Backward pass, oldest to newest. `limit` bounds the existing entries
    // still free for the current bank entry: older ones belong to older bank
    // entries already confirmed.
    let mut stats = MatchStats::default();
    let mut limit = existing.len();
    for i in (0..bank.len()).rev() {
        let tentative = match states[i] {
            LinkState::Tentative(t) => Some(t),
            _ => None,
        };
        let pick = match tentative {
            Some(t) if t < limit => Some(t),
            _ => choose(i, &bank[i], existing, &owner, limit, window),
        };
        if tentative.is_some() && pick != tentative {
            stats.demoted += 1;
        }
        states[i] = match pick {
            Some(j) => {
                limit = j;
                LinkState::Confirmed(j)
            }
            None => LinkState::Rejected,
        };
    }

    for (entry, state) in bank.iter_mut().zip(&states) {
        match *state {
            LinkState::Confirmed(j) => {
                entry.id = existing[j].id;
                stats.matched += 1;
            }
            LinkState::Rejected => stats.unmatched += 1,
            LinkState::Unvisited | LinkState::Tentative(_) => {
                unreachable!("backward pass settles every bank entry")
            }
        }
    }
    stats
}

/// Oldest eligible existing entry below `limit`, preferring one that no newer
/// bank entry holds from the forward pass.
fn choose(
    i: usize,
    bank: &Entry,
    existing: &[Entry],
    owner: &[Option<usize>],
    limit: usize,
    window: DateWindow,
) -> Option<usize> {
    let mut held = None;
    for j in (0..limit).rev() {
        if bank.date < existing[j].date {
            break;
        }
        if !window.allows(bank.date, existing[j].date) {
            continue;
        }
        match owner[j] {
            Some(k) if k < i => {
                held.get_or_insert(j);
            }
            _ => return Some(j),
        }
    }
    held
}

fn is_newest_first(entries: &[Entry]) -> bool {
    entries.windows(2).all(|w| w[0].date >= w[1].date)
}

/// Runs [`reconcile`] on every bank bucket against the existing bucket with
/// the same key. Bank entries without a counterpart bucket all become new.
pub fn reconcile_buckets(bank: &mut Buckets, existing: &Buckets, max_days: i64) -> MatchStats {
    let mut total = MatchStats::default();
    for (key, group) in bank.iter_mut() {
        let candidates = existing.get(key).unwrap_or_default();
        let stats = reconcile(group, candidates, DateWindow::for_key(key, max_days));
        tracing::debug!(
            amount = %key.amount,
            check_no = key.check_no.as_deref().unwrap_or(""),
            bank = group.len(),
            existing = candidates.len(),
            matched = stats.matched,
            demoted = stats.demoted,
            "reconciled bucket"
        );
        total.absorb(stats);
    }
    total
}
