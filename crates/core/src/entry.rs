use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::{AccountId, LedgerError};
use super::category::Category;
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub i64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Reviewed,
    #[default]
    NotReviewed,
    InProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatLine {
    pub category: Category,
    pub amount: Money,
    /// Only meaningful when `category` is an account: the transfer leg has
    /// been seen on that account's statement.
    #[serde(default)]
    pub reconciled: bool,
}

impl CatLine {
    pub fn new(category: Category, amount: Money) -> Self {
        CatLine {
            category,
            amount,
            reconciled: false,
        }
    }
}

/// The category side and payment side of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatPayment {
    pub payment: AccountId,
    pub reconciled: bool,
    lines: Vec<CatLine>,
}

impl CatPayment {
    pub fn uncategorized(payment: AccountId, amount: Money, reconciled: bool) -> Self {
        CatPayment {
            payment,
            reconciled,
            lines: vec![CatLine::new(Category::Uncategorized, amount)],
        }
    }

    pub fn single(
        payment: AccountId,
        category: Category,
        amount: Money,
        reconciled: bool,
    ) -> Result<Self, LedgerError> {
        Self::split(payment, vec![CatLine::new(category, amount)], reconciled)
    }

    pub fn split(
        payment: AccountId,
        lines: Vec<CatLine>,
        reconciled: bool,
    ) -> Result<Self, LedgerError> {
        if lines.is_empty() {
            return Err(LedgerError::EmptySplit);
        }
        if lines.iter().any(|l| l.category == Category::Account(payment)) {
            return Err(LedgerError::SelfTransfer(payment));
        }
        Ok(CatPayment {
            payment,
            reconciled,
            lines,
        })
    }

    pub fn lines(&self) -> &[CatLine] {
        &self.lines
    }

    pub fn amount(&self) -> Money {
        self.lines.iter().map(|l| l.amount).sum()
    }

    /// The category when there is exactly one line.
    pub fn single_category(&self) -> Option<Category> {
        match self.lines.as_slice() {
            [line] => Some(line.category),
            _ => None,
        }
    }

    pub fn is_uncategorized(&self) -> bool {
        self.single_category() == Some(Category::Uncategorized)
    }

    /// Replaces every line with a single line for the full amount.
    pub fn set_category(&mut self, category: Category) -> Result<(), LedgerError> {
        if category == Category::Account(self.payment) {
            return Err(LedgerError::SelfTransfer(self.payment));
        }
        self.lines = vec![CatLine::new(category, self.amount())];
        Ok(())
    }

    /// Marks the side of this entry that belongs to `account` as reconciled.
    /// Returns false if `account` is neither the payment account nor a
    /// transfer category of this entry.
    pub fn reconcile(&mut self, account: AccountId) -> bool {
        if self.payment == account {
            self.reconciled = true;
            return true;
        }
        let mut found = false;
        for line in &mut self.lines {
            if line.category == Category::Account(account) {
                line.reconciled = true;
                found = true;
            }
        }
        found
    }

    pub fn is_reconciled_for(&self, account: AccountId) -> bool {
        if self.payment == account {
            return self.reconciled;
        }
        let mut legs = self
            .lines
            .iter()
            .filter(|l| l.category == Category::Account(account))
            .peekable();
        legs.peek().is_some() && legs.all(|l| l.reconciled)
    }
}

/// A ledger transaction as seen by import and reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// `None` until the entry is persisted.
    pub id: Option<EntryId>,
    pub date: NaiveDate,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub check_no: Option<String>,
    pub cat_payment: CatPayment,
    #[serde(default)]
    pub status: ReviewStatus,
}

impl Entry {
    pub fn amount(&self) -> Money {
        self.cat_payment.amount()
    }

    /// The check number, with an empty string treated as absent.
    pub fn check_no(&self) -> Option<&str> {
        self.check_no.as_deref().filter(|c| !c.is_empty())
    }
}
