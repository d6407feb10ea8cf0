//! Plain-text views of the ledger: the history table and summary metrics.

use chrono::{Datelike, NaiveDate};

use crate::core::services::{Aggregate, AggregateKind};
use crate::currency::{format_currency, month_name};
use crate::domain::record::{
    amount_of, COL_AMOUNT, COL_CATEGORY, COL_CONCEPT, COL_EXPENSE_DATE, COL_STAGE,
};
use crate::storage::{Cell, Table};

const INDEX_HEADER: &str = "#";

/// History rows, newest first, each prefixed with its delete index.
pub fn history_lines(table: &Table, track_stages: bool, symbol: &str) -> Vec<String> {
    let mut columns = vec![COL_EXPENSE_DATE, COL_CONCEPT, COL_CATEGORY];
    if track_stages {
        columns.push(COL_STAGE);
    }
    columns.push(COL_AMOUNT);

    let mut grid: Vec<Vec<String>> = Vec::with_capacity(table.len() + 1);
    let mut header = vec![INDEX_HEADER.to_string()];
    header.extend(columns.iter().map(|column| column.to_string()));
    grid.push(header);

    for row in (0..table.len()).rev() {
        let mut line = vec![row.to_string()];
        for column in &columns {
            let cell = table.cell(row, column).unwrap_or(&Cell::Empty);
            let text = if *column == COL_AMOUNT {
                format_currency(amount_of(cell), symbol)
            } else {
                cell.to_text()
            };
            line.push(text);
        }
        grid.push(line);
    }

    let widths: Vec<usize> = (0..=columns.len())
        .map(|idx| {
            grid.iter()
                .map(|line| line[idx].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    grid.iter()
        .map(|line| {
            line.iter()
                .zip(&widths)
                .map(|(text, width)| pad(text, *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect()
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

/// Metric lines for a computed summary.
pub fn aggregate_lines(
    kind: AggregateKind,
    aggregate: &Aggregate,
    reference: NaiveDate,
    symbol: &str,
) -> Vec<String> {
    match aggregate {
        Aggregate::Amount(amount) => {
            let label = match kind {
                AggregateKind::Total => "Total spent".to_string(),
                AggregateKind::Week => "Spent this week".to_string(),
                AggregateKind::Month => format!("Spent in {}", month_name(reference.month())),
                AggregateKind::ByStage(filter) => format!("Spent on {filter}"),
                AggregateKind::ByCategory => "Spent".to_string(),
            };
            vec![format!("{label}: {}", format_currency(*amount, symbol))]
        }
        Aggregate::Breakdown(totals) => {
            let width = totals.keys().map(|key| key.chars().count()).max().unwrap_or(0);
            totals
                .iter()
                .map(|(category, amount)| {
                    format!("{}  {}", pad(category, width), format_currency(*amount, symbol))
                })
                .collect()
        }
    }
}
