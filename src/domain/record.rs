//! The expense row schema and its mapping to table cells.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::entry::parse_amount;
use crate::errors::LedgerError;
use crate::storage::{Cell, Table};

pub const COL_REGISTERED_AT: &str = "FECHA_REGISTRO";
pub const COL_CONCEPT: &str = "CONCEPTO";
pub const COL_CATEGORY: &str = "CATEGORIA";
pub const COL_STAGE: &str = "ETAPA";
pub const COL_AMOUNT: &str = "MONTO";
pub const COL_EXPENSE_DATE: &str = "FECHA_GASTO";

pub const REGISTERED_AT_FORMAT: &str = "%d/%m/%Y %H:%M";
pub const EXPENSE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Expense category. The fixed set plus a free-text label chosen under OTHER.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Labor,
    Materials,
    Permits,
    Freight,
    Other,
    Custom(String),
}

impl Category {
    pub const CHOICES: [Category; 5] = [
        Category::Labor,
        Category::Materials,
        Category::Permits,
        Category::Freight,
        Category::Other,
    ];

    /// Stored label: the upper-case name, or the custom text verbatim.
    pub fn label(&self) -> &str {
        match self {
            Category::Labor => "LABOR",
            Category::Materials => "MATERIALS",
            Category::Permits => "PERMITS",
            Category::Freight => "FREIGHT",
            Category::Other => "OTHER",
            Category::Custom(label) => label,
        }
    }

    /// Matches one of the fixed choices, case-insensitively.
    pub fn parse_choice(value: &str) -> Option<Category> {
        let value = value.trim();
        Self::CHOICES
            .iter()
            .find(|choice| choice.label().eq_ignore_ascii_case(value))
            .cloned()
    }

    /// Reads a stored label back. Only the exact upper-case names map to the
    /// fixed set, so a hand-typed `labor` stays its own custom category.
    pub fn from_label(value: &str) -> Category {
        let value = value.trim();
        Self::CHOICES
            .iter()
            .find(|choice| choice.label() == value)
            .cloned()
            .unwrap_or_else(|| Category::Custom(value.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Construction phase, tracked only when stage tracking is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Foundation,
    Structure,
    Installations,
    Finishes,
    Exteriors,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Foundation,
        Stage::Structure,
        Stage::Installations,
        Stage::Finishes,
        Stage::Exteriors,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Foundation => "FOUNDATION",
            Stage::Structure => "STRUCTURE",
            Stage::Installations => "INSTALLATIONS",
            Stage::Finishes => "FINISHES",
            Stage::Exteriors => "EXTERIORS",
        }
    }

    pub fn parse(value: &str) -> Option<Stage> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.label().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    /// `None` when a stored timestamp is missing or unreadable.
    pub registered_at: Option<NaiveDateTime>,
    pub concept: String,
    pub category: Category,
    pub stage: Option<Stage>,
    pub amount: f64,
    pub expense_date: NaiveDate,
}

impl ExpenseRecord {
    /// Cells to append for this record, in persisted column order.
    pub fn to_cells(&self, track_stages: bool) -> Vec<(&'static str, Cell)> {
        let registered_at = self
            .registered_at
            .map(|at| Cell::Text(at.format(REGISTERED_AT_FORMAT).to_string()))
            .unwrap_or_default();
        let mut cells = vec![
            (COL_REGISTERED_AT, registered_at),
            (COL_CONCEPT, Cell::text(self.concept.clone())),
            (COL_CATEGORY, Cell::text(self.category.label())),
        ];
        if track_stages {
            let stage = self
                .stage
                .map(|stage| Cell::text(stage.label()))
                .unwrap_or_default();
            cells.push((COL_STAGE, stage));
        }
        cells.push((COL_AMOUNT, Cell::Number(self.amount)));
        cells.push((
            COL_EXPENSE_DATE,
            Cell::Text(self.expense_date.format(EXPENSE_DATE_FORMAT).to_string()),
        ));
        cells
    }

    /// Parses row `row` of `table`. Only the expense date is strict.
    pub fn from_row(table: &Table, row: usize) -> Result<Self, LedgerError> {
        let text = |column: &str| {
            table
                .cell(row, column)
                .map(Cell::to_text)
                .unwrap_or_default()
        };

        let raw_date = text(COL_EXPENSE_DATE);
        let expense_date = NaiveDate::parse_from_str(raw_date.trim(), EXPENSE_DATE_FORMAT)
            .map_err(|_| LedgerError::DateParse {
                row,
                value: raw_date.clone(),
            })?;

        let registered_at =
            NaiveDateTime::parse_from_str(text(COL_REGISTERED_AT).trim(), REGISTERED_AT_FORMAT)
                .ok();
        let stage = Stage::parse(&text(COL_STAGE));

        Ok(Self {
            registered_at,
            concept: text(COL_CONCEPT),
            category: Category::from_label(&text(COL_CATEGORY)),
            stage,
            amount: table.cell(row, COL_AMOUNT).map(amount_of).unwrap_or(0.0),
            expense_date,
        })
    }

    /// Parses every row; the first malformed expense date fails the whole table.
    pub fn from_table(table: &Table) -> Result<Vec<Self>, LedgerError> {
        (0..table.len())
            .map(|row| Self::from_row(table, row))
            .collect()
    }
}

/// Numeric value of an amount cell; text goes through [`parse_amount`].
pub fn amount_of(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(value) => *value,
        Cell::Text(text) => parse_amount(text),
        Cell::Empty => 0.0,
    }
}
