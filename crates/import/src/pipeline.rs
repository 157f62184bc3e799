use std::collections::HashSet;

use ledger_core::{AccountId, Entry};
use serde::Serialize;
use thiserror::Error;

use crate::bucket::{BucketAccumulator, Buckets};
use crate::categorizer::{Classifier, TrainingAccumulator};
use crate::config::{ConfigError, ImportConfig};
use crate::diff::{changes, ChangeSet, ChangeSummary};
use crate::match_engine::{reconcile_buckets, MatchStats};

/// Persistence collaborator of an import.
pub trait LedgerStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Up to `limit` entries across all accounts, newest first.
    fn recent_entries(&self, limit: usize) -> Result<Vec<Entry>, Self::Error>;

    /// Entries of `account` not yet matched to a statement line, newest first.
    fn unreconciled_entries(&self, account: AccountId) -> Result<Vec<Entry>, Self::Error>;

    /// The subset of `candidates` already imported into `account`.
    fn processed_fit_ids(
        &self,
        account: AccountId,
        candidates: &[String],
    ) -> Result<HashSet<String>, Self::Error>;

    /// Applies every add, update and processed id atomically.
    fn apply(&mut self, account: AccountId, changes: &ChangeSet) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum ImportError<E: std::error::Error + 'static> {
    #[error("Failed to load unreconciled entries: {0}")]
    Unreconciled(#[source] E),
    #[error("Failed to look up imported transaction ids: {0}")]
    ProcessedIds(#[source] E),
    #[error("Failed to apply changes: {0}")]
    Apply(#[source] E),
    #[error("Bank record paid from account {found} cannot be imported into account {expected}")]
    ForeignRecord { expected: AccountId, found: AccountId },
}

/// One line of a bank file, already normalized by its format adapter.
#[derive(Debug, Clone)]
pub struct BankRecord {
    /// Stable bank transaction id (OFX `FITID`); CSV exports have none.
    pub fit_id: Option<String>,
    pub entry: Entry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum CategorizerStatus {
    Trained { names: usize },
    Disabled,
    /// The history scan failed and the import ran without auto-categorization.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub summary: ChangeSummary,
    pub categorized: usize,
    pub skipped_duplicates: usize,
    pub categorizer: CategorizerStatus,
    #[serde(skip)]
    pub matching: MatchStats,
}

pub struct ImportSession {
    config: ImportConfig,
}

impl ImportSession {
    pub fn new(config: ImportConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Imports `records` into `account` and applies the result through `store`.
    pub fn run<S: LedgerStore>(
        &self,
        store: &mut S,
        account: AccountId,
        records: Vec<BankRecord>,
    ) -> Result<ImportReport, ImportError<S::Error>> {
        let (changes, report) = self.prepare(store, account, records)?;
        if !changes.is_empty() || !changes.processed_fit_ids.is_empty() {
            store.apply(account, &changes).map_err(ImportError::Apply)?;
        }
        Ok(report)
    }

    /// Computes the change set for an import without applying it.
    pub fn prepare<S: LedgerStore>(
        &self,
        store: &S,
        account: AccountId,
        records: Vec<BankRecord>,
    ) -> Result<(ChangeSet, ImportReport), ImportError<S::Error>> {
        let total = records.len();
        let records = statement_lines(account, records)?;
        let (mut bank, processed_fit_ids) = drop_imported(store, account, records)?;
        let skipped_duplicates = total - bank.len();

        let (classifier, categorizer) = self.train(store);
        let mut categorized = 0;
        if let Some(classifier) = &classifier {
            for entry in bank.iter_mut().filter(|e| e.cat_payment.is_uncategorized()) {
                if classifier.classify(entry) {
                    categorized += 1;
                }
            }
        }

        let mut existing = BucketAccumulator::new();
        existing.extend(
            store
                .unreconciled_entries(account)
                .map_err(ImportError::Unreconciled)?,
        );
        let existing = existing.finish();
        let mut bank = Buckets::sorted(bank);
        let matching = reconcile_buckets(&mut bank, &existing, self.config.max_days);

        let mut change_set = changes(bank.into_entries());
        change_set.processed_fit_ids = processed_fit_ids;

        let report = ImportReport {
            summary: change_set.summary(),
            categorized,
            skipped_duplicates,
            categorizer,
            matching,
        };
        tracing::info!(
            %account,
            records = total,
            skipped = skipped_duplicates,
            adds = report.summary.adds,
            updates = report.summary.updates,
            categorized,
            "prepared import"
        );
        Ok((change_set, report))
    }

    fn train<S: LedgerStore>(&self, store: &S) -> (Option<Classifier>, CategorizerStatus) {
        if !self.config.auto_categorize {
            return (None, CategorizerStatus::Disabled);
        }
        match store.recent_entries(self.config.history_limit) {
            Ok(history) => {
                let mut acc =
                    TrainingAccumulator::new(self.config.train_window, self.config.train_threshold);
                acc.extend(history.iter().take(self.config.history_limit));
                let classifier = acc.build();
                let status = CategorizerStatus::Trained {
                    names: classifier.len(),
                };
                (Some(classifier), status)
            }
            Err(e) => {
                tracing::warn!("Skipping auto-categorization, history scan failed: {e}");
                (None, CategorizerStatus::Unavailable(e.to_string()))
            }
        }
    }
}

/// Every statement line is paid from the imported account and, having
/// cleared the bank, is reconciled there.
fn statement_lines<E: std::error::Error + 'static>(
    account: AccountId,
    mut records: Vec<BankRecord>,
) -> Result<Vec<BankRecord>, ImportError<E>> {
    for record in &mut records {
        let cat_payment = &mut record.entry.cat_payment;
        if cat_payment.payment != account {
            return Err(ImportError::ForeignRecord {
                expected: account,
                found: cat_payment.payment,
            });
        }
        cat_payment.reconciled = true;
    }
    Ok(records)
}

/// Removes records whose bank id was seen in an earlier import or earlier in
/// this batch. Returns the surviving entries and their new bank ids.
fn drop_imported<S: LedgerStore>(
    store: &S,
    account: AccountId,
    records: Vec<BankRecord>,
) -> Result<(Vec<Entry>, Vec<String>), ImportError<S::Error>> {
    let candidates: Vec<String> = records.iter().filter_map(|r| r.fit_id.clone()).collect();
    let known = if candidates.is_empty() {
        HashSet::new()
    } else {
        store
            .processed_fit_ids(account, &candidates)
            .map_err(ImportError::ProcessedIds)?
    };

    let mut seen = HashSet::new();
    let mut fresh = Vec::new();
    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        if let Some(fit_id) = record.fit_id {
            if known.contains(&fit_id) || !seen.insert(fit_id.clone()) {
                continue;
            }
            fresh.push(fit_id);
        }
        entries.push(record.entry);
    }
    Ok((entries, fresh))
}
