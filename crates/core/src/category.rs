use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::{AccountId, ExpenseId};

/// What the category side of an entry line points at.
///
/// `Uncategorized` is a placeholder, not a real category: bank imports start
/// with it and the classifier never learns or assigns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Category {
    #[default]
    Uncategorized,
    Expense(ExpenseId),
    /// Transfer to or from another payment account.
    Account(AccountId),
}

impl Category {
    pub fn is_uncategorized(self) -> bool {
        self == Category::Uncategorized
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Uncategorized => write!(f, "uncategorized"),
            Category::Expense(id) => write!(f, "expense:{id}"),
            Category::Account(id) => write!(f, "account:{id}"),
        }
    }
}
