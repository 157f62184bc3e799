pub mod account;
pub mod category;
pub mod entry;
pub mod money;

pub use account::{AccountId, ExpenseId, LedgerError};
pub use category::Category;
pub use entry::{CatLine, CatPayment, Entry, EntryId, ReviewStatus};
pub use money::Money;
