pub mod bucket;
pub mod categorizer;
pub mod config;
pub mod diff;
pub mod match_engine;
pub mod normalize;
pub mod pipeline;

pub use bucket::{BucketAccumulator, BucketKey, Buckets};
pub use categorizer::{Classifier, TrainingAccumulator};
pub use config::{ConfigError, ImportConfig};
pub use diff::{changes, ChangeSet, ChangeSummary, Merge};
pub use match_engine::{reconcile, reconcile_buckets, DateWindow, MatchStats};
pub use normalize::normalize_name;
pub use pipeline::{
    BankRecord, CategorizerStatus, ImportError, ImportReport, ImportSession, LedgerStore,
};
