//! Tabular content.
//!
//! A [`Table`] is an ordered list of column names plus rows of JSON scalar
//! cells. On the wire it is a list of lists: the header row first, then one
//! list per data row, which keeps column order and cell types intact.
//!
//! Tables also have a canonical display string (a fixed-width grid with a
//! positional row index). It is what a table document hashes to and what a
//! MultiLabel exposes as the context of a table label.

use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::SchemaError;

/// Rendering options for [`Table::display_string`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Cells longer than this many characters are cut and end in `...`.
    pub max_colwidth: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self { max_colwidth: 80 }
    }
}

/// A table of JSON scalar cells with named columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Creates a table from column names and rows.
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidTable`] if a row's width differs from the
    /// number of columns.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, SchemaError> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(SchemaError::InvalidTable(format!(
                    "row {} has {} cell(s), expected {}",
                    idx,
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Creates a table from named columns of equal length.
    ///
    /// ```
    /// use qalabel::schema::Table;
    /// use serde_json::json;
    ///
    /// let table = Table::from_columns(vec![
    ///     ("col1".to_string(), vec![json!(1), json!(2)]),
    ///     ("col2".to_string(), vec![json!(3), json!(4)]),
    /// ])?;
    /// assert_eq!(table.to_string(), "   col1  col2\n0     1     3\n1     2     4");
    /// # Ok::<(), qalabel::SchemaError>(())
    /// ```
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Result<Self, SchemaError> {
        let n_rows = columns.first().map_or(0, |(_, values)| values.len());
        if let Some((name, values)) = columns.iter().find(|(_, v)| v.len() != n_rows) {
            return Err(SchemaError::InvalidTable(format!(
                "column '{}' has {} value(s), expected {}",
                name,
                values.len(),
                n_rows
            )));
        }

        let mut rows = vec![Vec::with_capacity(columns.len()); n_rows];
        let mut names = Vec::with_capacity(columns.len());
        for (name, values) in columns {
            names.push(name);
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
        }
        Ok(Self {
            columns: names,
            rows,
        })
    }

    /// Column headers, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows, each as long as [`columns`](Self::columns).
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Returns the cell at `(row, col)`, if it exists.
    pub fn cell(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Renders the table as a fixed-width grid.
    pub fn display_string(&self, opts: &DisplayOptions) -> String {
        if self.rows.is_empty() || self.columns.is_empty() {
            let index: Vec<String> = (0..self.rows.len()).map(|i| i.to_string()).collect();
            return format!(
                "Empty DataFrame\nColumns: [{}]\nIndex: [{}]",
                self.columns.join(", "),
                index.join(", ")
            );
        }

        let formatted: Vec<Vec<String>> = (0..self.columns.len())
            .map(|col| {
                format_column(self.rows.iter().map(|row| &row[col]))
                    .into_iter()
                    .map(|cell| truncate(cell, opts.max_colwidth))
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&formatted)
            .map(|(name, cells)| {
                cells
                    .iter()
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let index_width = (self.rows.len() - 1).to_string().len();

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        let mut header = " ".repeat(index_width);
        for (name, width) in self.columns.iter().zip(&widths) {
            header.push_str("  ");
            header.push_str(&pad_left(name, *width));
        }
        lines.push(header);

        for row in 0..self.rows.len() {
            let mut line = format!("{:<width$}", row, width = index_width);
            for (cells, width) in formatted.iter().zip(&widths) {
                line.push_str("  ");
                line.push_str(&pad_left(&cells[row], *width));
            }
            lines.push(line);
        }

        lines.join("\n")
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string(&DisplayOptions::default()))
    }
}

impl Serialize for Table {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.rows.len() + 1))?;
        seq.serialize_element(&self.columns)?;
        for row in &self.rows {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Table {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut records = Vec::<Vec<Value>>::deserialize(deserializer)?.into_iter();
        let header = records
            .next()
            .ok_or_else(|| D::Error::custom("table needs a header row"))?;
        let columns = header
            .into_iter()
            .map(|name| match name {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
        Table::new(columns, records.collect()).map_err(D::Error::custom)
    }
}

/// Formats one column's cells; numeric columns holding any float get a
/// uniform number of decimals.
fn format_column<'a>(cells: impl Iterator<Item = &'a Value> + Clone) -> Vec<String> {
    let numeric = cells.clone().all(|c| c.is_number() || c.is_null());
    let has_float = cells
        .clone()
        .any(|c| matches!(c, Value::Number(n) if n.is_f64()));

    if numeric && has_float {
        let decimals = cells
            .clone()
            .filter_map(Value::as_f64)
            .map(decimals_needed)
            .max()
            .unwrap_or(1);
        return cells
            .map(|c| match c.as_f64() {
                Some(x) => format!("{:.*}", decimals, x),
                None => "NaN".to_string(),
            })
            .collect();
    }

    cells
        .map(|c| match c {
            Value::String(s) => s.clone(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Null if numeric => "NaN".to_string(),
            Value::Null => "None".to_string(),
            other => other.to_string(),
        })
        .collect()
}

fn decimals_needed(x: f64) -> usize {
    let repr = x.to_string();
    let decimals = repr.split_once('.').map_or(0, |(_, frac)| frac.len());
    decimals.clamp(1, 6)
}

fn truncate(cell: String, max: usize) -> String {
    if cell.chars().count() <= max {
        return cell;
    }
    let kept: String = cell.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn pad_left(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{}{}", " ".repeat(width - len), s)
    }
}
