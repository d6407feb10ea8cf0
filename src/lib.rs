#![doc(test(attr(deny(warnings))))]

//! Site Ledger keeps a construction project's expense ledger in a whole-table
//! store: validated appends, confirmed deletes, retrying reads, and the
//! weekly, monthly, category and stage totals derived from them.

pub mod cli;
pub mod config;
pub mod core;
pub mod currency;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Site Ledger tracing initialized.");
    });
}
