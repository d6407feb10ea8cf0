#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use site_ledger::{
    core::{services::LedgerService, FixedClock, LedgerReader, RetryPolicy},
    storage::{JsonTableStore, RemoteTableStore},
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// JSON store in its own directory.
pub fn setup_json_store() -> JsonTableStore {
    JsonTableStore::new(temp_base().join("ledger.json"))
}

pub fn at(day: u32, month: u32, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Wednesday 13/03/2024 18:30.
pub fn now() -> NaiveDateTime {
    at(13, 3, 2024).and_hms_opt(18, 30, 0).expect("valid time")
}

/// Service with no read backoff and a fixed clock.
pub fn service_over(store: impl RemoteTableStore + 'static) -> LedgerService {
    let reader = LedgerReader::new(RetryPolicy::new(3, Duration::ZERO));
    LedgerService::new(Box::new(store), reader, Box::new(FixedClock(now())))
}
