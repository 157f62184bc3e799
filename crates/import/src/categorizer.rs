use std::collections::HashMap;

use ledger_core::{Category, Entry};

use crate::config::ConfigError;
use crate::normalize::normalize_name;

#[derive(Debug, Clone)]
enum TrainingState {
    Counting {
        counts: HashMap<Category, usize>,
        samples: usize,
    },
    /// `Uncategorized` here means the window ran out without a consensus.
    Locked(Category),
}

/// Learns a payee name to category mapping from ledger history.
///
/// Feed entries most recent first. For each normalized name at most `window`
/// samples are considered; the first category seen `threshold` times wins and
/// later samples for that name are ignored.
#[derive(Debug, Clone)]
pub struct TrainingAccumulator {
    window: usize,
    threshold: usize,
    names: HashMap<String, TrainingState>,
}

impl TrainingAccumulator {
    /// # Panics
    ///
    /// Panics unless `window >= threshold >= 1`.
    pub fn new(window: usize, threshold: usize) -> Self {
        match Self::try_new(window, threshold) {
            Ok(acc) => acc,
            Err(e) => panic!("{e}"),
        }
    }

    pub fn try_new(window: usize, threshold: usize) -> Result<Self, ConfigError> {
        if threshold < 1 || threshold > window {
            return Err(ConfigError::InvalidTrainer { window, threshold });
        }
        Ok(Self {
            window,
            threshold,
            names: HashMap::new(),
        })
    }

    pub fn include(&mut self, entry: &Entry) {
        // Splits carry no single signal.
        let category = entry
            .cat_payment
            .single_category()
            .unwrap_or(Category::Uncategorized);

        // All-number names share no payee.
        let name = normalize_name(&entry.name);
        if name.is_empty() {
            return;
        }
        let state = self
            .names
            .entry(name)
            .or_insert_with(|| TrainingState::Counting {
                counts: HashMap::new(),
                samples: 0,
            });

        let TrainingState::Counting { counts, samples } = state else {
            return;
        };
        let count = counts.entry(category).or_insert(0);
        *count += 1;
        *samples += 1;
        if *count >= self.threshold {
            *state = TrainingState::Locked(category);
        } else if *samples >= self.window {
            *state = TrainingState::Locked(Category::Uncategorized);
        }
    }

    pub fn build(self) -> Classifier {
        let names: HashMap<String, Category> = self
            .names
            .into_iter()
            .filter_map(|(name, state)| match state {
                TrainingState::Locked(category) if !category.is_uncategorized() => {
                    Some((name, category))
                }
                _ => None,
            })
            .collect();
        tracing::debug!(names = names.len(), "built classifier");
        Classifier { names }
    }
}

impl<'a> Extend<&'a Entry> for TrainingAccumulator {
    fn extend<T: IntoIterator<Item = &'a Entry>>(&mut self, iter: T) {
        for entry in iter {
            self.include(entry);
        }
    }
}

/// Frozen output of a [`TrainingAccumulator`].
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    names: HashMap<String, Category>,
}

impl Classifier {
    pub fn lookup(&self, name: &str) -> Option<Category> {
        let name = normalize_name(name);
        if name.is_empty() {
            return None;
        }
        self.names.get(&name).copied()
    }

    /// Assigns the learned category to `entry`, replacing any split.
    ///
    /// Returns false and leaves the entry untouched when the name is unknown or
    /// the learned category is the entry's own payment account.
    pub fn classify(&self, entry: &mut Entry) -> bool {
        match self.lookup(&entry.name) {
            Some(category) => entry.cat_payment.set_category(category).is_ok(),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledger_core::{AccountId, CatLine, CatPayment, ExpenseId, Money, ReviewStatus};

    const CHECKING: AccountId = AccountId(1);

    fn cat(n: i64) -> Category {
        Category::Expense(ExpenseId(n))
    }

    fn make_entry(name: &str, category: Category) -> Entry {
        let cat_payment = if category.is_uncategorized() {
            CatPayment::uncategorized(CHECKING, Money::from_cents(-500), false)
        } else {
            CatPayment::single(CHECKING, category, Money::from_cents(-500), false).unwrap()
        };
        Entry {
            id: None,
            date: NaiveDate::from_ymd_opt(2013, 4, 1).unwrap(),
            name: name.to_string(),
            description: String::new(),
            check_no: None,
            cat_payment,
            status: ReviewStatus::Reviewed,
        }
    }

    fn train(n: usize, k: usize, history: &[(&str, Category)]) -> Classifier {
        let mut acc = TrainingAccumulator::new(n, k);
        for (name, category) in history {
            acc.include(&make_entry(name, *category));
        }
        acc.build()
    }

    #[test]
    fn threshold_reached_within_window() {
        let classifier = train(6, 3, &[("a", cat(1)), ("a", cat(1)), ("a", cat(1))]);
        let mut fresh = make_entry("a", Category::Uncategorized);
        assert!(classifier.classify(&mut fresh));
        assert_eq!(fresh.cat_payment.single_category(), Some(cat(1)));
    }

    #[test]
    fn no_consensus_when_categories_disagree() {
        let classifier = train(6, 3, &[("a", cat(1)), ("a", cat(2)), ("a", cat(3))]);
        let mut fresh = make_entry("a", Category::Uncategorized);
        assert!(!classifier.classify(&mut fresh));
        assert!(fresh.cat_payment.is_uncategorized());
        assert!(classifier.is_empty());
    }

    #[test]
    fn window_exhausted_locks_out_later_votes() {
        let history = [
            ("a", cat(1)),
            ("a", cat(2)),
            ("a", cat(1)),
            ("a", cat(2)),
            // window of four is used up; these never count
            ("a", cat(1)),
            ("a", cat(1)),
        ];
        let classifier = train(4, 3, &history);
        assert_eq!(classifier.lookup("a"), None);
    }

    #[test]
    fn early_stop_ignores_older_history() {
        let history = [
            ("a", cat(1)),
            ("a", cat(1)),
            ("a", cat(2)),
            ("a", cat(2)),
            ("a", cat(2)),
        ];
        let classifier = train(6, 2, &history);
        assert_eq!(classifier.lookup("a"), Some(cat(1)));
    }

    #[test]
    fn uncategorized_history_never_becomes_a_rule() {
        let classifier = train(
            6,
            2,
            &[("a", Category::Uncategorized), ("a", Category::Uncategorized), ("a", cat(1))],
        );
        assert_eq!(classifier.lookup("a"), None);
    }

    #[test]
    fn split_history_counts_as_no_signal() {
        let mut acc = TrainingAccumulator::new(2, 2);
        let mut split = make_entry("a", cat(1));
        split.cat_payment = CatPayment::split(
            CHECKING,
            vec![
                CatLine::new(cat(1), Money::from_cents(-300)),
                CatLine::new(cat(2), Money::from_cents(-200)),
            ],
            false,
        )
        .unwrap();
        acc.include(&split);
        acc.include(&make_entry("a", cat(1)));
        assert_eq!(acc.build().lookup("a"), None);
    }

    #[test]
    fn store_numbers_share_training() {
        let classifier = train(
            6,
            2,
            &[("SAFEWAY STORE 003", cat(7)), ("SAFEWAY #06 STORE", cat(7))],
        );
        assert_eq!(classifier.lookup("Safeway Store 1234"), Some(cat(7)));
        assert_eq!(classifier.len(), 1);
    }

    #[test]
    fn numeric_only_names_are_not_learned() {
        let classifier = train(6, 2, &[("1234", cat(1)), ("#5678", cat(1))]);
        assert!(classifier.is_empty());
        let mut fresh = make_entry("9012", Category::Uncategorized);
        assert!(!classifier.classify(&mut fresh));
        assert!(fresh.cat_payment.is_uncategorized());
    }

    #[test]
    fn classify_replaces_split() {
        let classifier = train(6, 1, &[("a", cat(1))]);
        let mut fresh = make_entry("a", cat(2));
        fresh.cat_payment = CatPayment::split(
            CHECKING,
            vec![
                CatLine::new(cat(2), Money::from_cents(-300)),
                CatLine::new(cat(3), Money::from_cents(-200)),
            ],
            false,
        )
        .unwrap();
        assert!(classifier.classify(&mut fresh));
        assert_eq!(fresh.cat_payment.single_category(), Some(cat(1)));
        assert_eq!(fresh.amount(), Money::from_cents(-500));
    }

    #[test]
    fn classify_rejects_own_payment_account() {
        // Learned from the savings side of past transfers into checking.
        let mut history = make_entry("transfer", Category::Uncategorized);
        history.cat_payment =
            CatPayment::single(AccountId(2), Category::Account(CHECKING), Money::from_cents(500), false)
                .unwrap();
        let mut acc = TrainingAccumulator::new(6, 1);
        acc.include(&history);
        let classifier = acc.build();
        assert_eq!(classifier.lookup("transfer"), Some(Category::Account(CHECKING)));
        let mut fresh = make_entry("transfer", Category::Uncategorized);
        assert!(!classifier.classify(&mut fresh));
        assert!(fresh.cat_payment.is_uncategorized());
    }

    #[test]
    fn unknown_name_is_left_alone() {
        let classifier = train(6, 1, &[("a", cat(1))]);
        let mut fresh = make_entry("b", Category::Uncategorized);
        assert!(!classifier.classify(&mut fresh));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(TrainingAccumulator::try_new(3, 0).is_err());
        assert!(TrainingAccumulator::try_new(2, 3).is_err());
        assert!(TrainingAccumulator::try_new(1, 1).is_ok());
    }

    #[test]
    #[should_panic]
    fn threshold_above_window_panics() {
        TrainingAccumulator::new(2, 3);
    }
}
