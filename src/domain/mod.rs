//! Ledger row schema and entry validation.

pub mod entry;
pub mod record;

pub use entry::{
    default_amount_for, parse_amount, resolve_category, EntryDraft, Rejection, ValidEntry,
};
pub use record::{Category, ExpenseRecord, Stage};
