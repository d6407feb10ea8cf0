use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Duration, NaiveDate};

use crate::domain::{ExpenseRecord, Stage};
use crate::errors::LedgerError;
use crate::storage::Table;

/// Stage selection for the by-stage view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageFilter {
    #[default]
    All,
    Only(Stage),
}

impl StageFilter {
    pub fn parse(value: &str) -> Option<StageFilter> {
        if value.trim().eq_ignore_ascii_case("all") {
            Some(StageFilter::All)
        } else {
            Stage::parse(value).map(StageFilter::Only)
        }
    }

    fn matches(self, stage: Option<Stage>) -> bool {
        match self {
            StageFilter::All => true,
            StageFilter::Only(wanted) => stage == Some(wanted),
        }
    }
}

impl fmt::Display for StageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFilter::All => f.write_str("all stages"),
            StageFilter::Only(stage) => write!(f, "{stage}"),
        }
    }
}

/// Which summary to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateKind {
    #[default]
    Total,
    Week,
    Month,
    ByCategory,
    ByStage(StageFilter),
}

impl AggregateKind {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::Total => "total",
            AggregateKind::Week => "week",
            AggregateKind::Month => "month",
            AggregateKind::ByCategory => "category",
            AggregateKind::ByStage(_) => "stage",
        }
    }
}

/// A computed summary: a single sum or a per-category breakdown.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    Amount(f64),
    Breakdown(BTreeMap<String, f64>),
}

impl Aggregate {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Aggregate::Amount(value) => Some(*value),
            Aggregate::Breakdown(_) => None,
        }
    }

    pub fn breakdown(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            Aggregate::Breakdown(map) => Some(map),
            Aggregate::Amount(_) => None,
        }
    }
}

pub struct SummaryService;

impl SummaryService {
    /// Computes `kind` over `table` relative to `reference`.
    ///
    /// Every row's expense date is parsed first; one malformed date fails the
    /// whole computation.
    pub fn aggregate(
        kind: AggregateKind,
        table: &Table,
        reference: NaiveDate,
    ) -> Result<Aggregate, LedgerError> {
        let records = ExpenseRecord::from_table(table)?;
        Ok(Self::aggregate_records(kind, &records, reference))
    }

    pub fn aggregate_records(
        kind: AggregateKind,
        records: &[ExpenseRecord],
        reference: NaiveDate,
    ) -> Aggregate {
        match kind {
            AggregateKind::Total => Aggregate::Amount(sum(records.iter())),
            AggregateKind::Week => {
                let start = Self::week_start(reference);
                Aggregate::Amount(sum(records.iter().filter(|r| r.expense_date >= start)))
            }
            // Month number only: the same month of any year is counted.
            AggregateKind::Month => {
                let month = reference.month();
                Aggregate::Amount(sum(records.iter().filter(|r| r.expense_date.month() == month)))
            }
            AggregateKind::ByCategory => {
                let mut totals = BTreeMap::new();
                for record in records {
                    *totals
                        .entry(record.category.label().to_string())
                        .or_insert(0.0) += record.amount;
                }
                Aggregate::Breakdown(totals)
            }
            AggregateKind::ByStage(filter) => {
                Aggregate::Amount(sum(records.iter().filter(|r| filter.matches(r.stage))))
            }
        }
    }

    /// Monday of the week containing `reference`.
    pub fn week_start(reference: NaiveDate) -> NaiveDate {
        let offset = reference.weekday().num_days_from_monday();
        reference - Duration::days(i64::from(offset))
    }
}

fn sum<'a>(records: impl Iterator<Item = &'a ExpenseRecord>) -> f64 {
    records.map(|record| record.amount).sum()
}
