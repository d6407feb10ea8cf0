pub mod ledger_service;
pub mod summary_service;

pub use ledger_service::{AppendOutcome, LedgerService};
pub use summary_service::{Aggregate, AggregateKind, StageFilter, SummaryService};
