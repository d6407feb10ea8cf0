//! Untyped tabular snapshot exchanged with table stores.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One untyped cell. Serialized as JSON `null`, a number, or a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Renders the cell as text; whole numbers drop their fractional part.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Text(text) => f.write_str(text),
        }
    }
}

/// Column-named rows, in store order. Index 0 is the oldest row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Returns the cell at `row` under `column`. Short rows read as empty.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        let row = self.rows.get(row)?;
        Some(row.get(index).unwrap_or(&Cell::Empty))
    }

    /// Trims surrounding whitespace from every column name.
    pub fn normalize_columns(&mut self) {
        for column in &mut self.columns {
            let trimmed = column.trim();
            if trimmed.len() != column.len() {
                *column = trimmed.to_string();
            }
        }
    }

    /// Appends a row given as `(column, value)` pairs.
    ///
    /// Unknown columns are added at the end and earlier rows are padded with
    /// empty cells, mirroring a column-union concatenation.
    pub fn push_record<'a, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (&'a str, Cell)>,
    {
        let mut row = vec![Cell::Empty; self.columns.len()];
        for (column, value) in values {
            let index = match self.column_index(column) {
                Some(index) => index,
                None => {
                    self.columns.push(column.to_string());
                    row.push(Cell::Empty);
                    self.columns.len() - 1
                }
            };
            row[index] = value;
        }
        let width = self.columns.len();
        for existing in &mut self.rows {
            existing.resize(width, Cell::Empty);
        }
        self.rows.push(row);
    }

    /// Removes and returns the row at `index`.
    pub fn remove_row(&mut self, index: usize) -> Option<Vec<Cell>> {
        if index < self.rows.len() {
            Some(self.rows.remove(index))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_record_adds_missing_columns_and_pads_rows() {
        let mut table = Table::new(vec!["A".into()], vec![vec![Cell::Number(1.0)]]);
        table.push_record([("A", Cell::Number(2.0)), ("B", Cell::text("x"))]);

        assert_eq!(table.columns(), ["A".to_string(), "B".to_string()]);
        assert_eq!(table.rows()[0], vec![Cell::Number(1.0), Cell::Empty]);
        assert_eq!(table.cell(1, "B"), Some(&Cell::text("x")));
    }

    #[test]
    fn normalize_columns_trims_whitespace() {
        let mut table = Table::new(vec![" MONTO ".into(), "CONCEPTO\t".into()], Vec::new());
        table.normalize_columns();
        assert_eq!(table.column_index("MONTO"), Some(0));
        assert_eq!(table.column_index("CONCEPTO"), Some(1));
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(Cell::Number(400.0).to_text(), "400");
        assert_eq!(Cell::Number(12.5).to_text(), "12.5");
        assert_eq!(Cell::Empty.to_text(), "");
    }

    #[test]
    fn short_rows_read_as_empty_cells() {
        let table = Table::new(vec!["A".into(), "B".into()], vec![vec![Cell::text("a")]]);
        assert_eq!(table.cell(0, "B"), Some(&Cell::Empty));
        assert_eq!(table.cell(0, "C"), None);
        assert_eq!(table.cell(3, "A"), None);
    }
}
