//! Bounded-retry reads against a table store.

use std::{thread, time::Duration};

use crate::config::Config;
use crate::storage::{RemoteTableStore, Table};

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// How many times to try a read and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.read_attempts,
            Duration::from_millis(config.read_backoff_ms),
        )
    }
}

/// Always-fresh reader. Never fails: once attempts are exhausted it returns an
/// empty table, which callers cannot tell apart from a genuinely empty ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerReader {
    policy: RetryPolicy,
}

impl LedgerReader {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Reads with retry; empty table once attempts are exhausted.
    pub fn read(&self, store: &dyn RemoteTableStore) -> Table {
        self.fetch(store).unwrap_or_default()
    }

    /// Like [`read`](Self::read) but reports exhaustion as `None`, so callers
    /// that cache can avoid holding on to a table the store never produced.
    pub fn fetch(&self, store: &dyn RemoteTableStore) -> Option<Table> {
        let attempts = self.policy.attempts.max(1);
        for attempt in 1..=attempts {
            match store.read() {
                Ok(mut table) => {
                    table.normalize_columns();
                    tracing::debug!(attempt, rows = table.len(), "ledger read");
                    return Some(table);
                }
                Err(err) => {
                    tracing::warn!(attempt, attempts, error = %err, "ledger read failed");
                    if attempt < attempts && !self.policy.backoff.is_zero() {
                        thread::sleep(self.policy.backoff);
                    }
                }
            }
        }
        tracing::error!(attempts, "ledger unreachable, continuing with an empty table");
        None
    }
}
