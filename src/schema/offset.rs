//! Offset value types: character spans and table cells.
//!
//! An answer points into its document either with a half-open character
//! [`Span`] (text content) or with a [`TableCell`] (tabular content). The
//! [`Offset`] sum type carries either one; on the wire the variant is chosen
//! by the keys of the mapping (`start`/`end` or `row`/`col`).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

use crate::error::SchemaError;

/// A half-open range `[start, end)` over character offsets.
///
/// Construction is permissive: a `Span` with `end <= start` can be
/// represented (no-answer labels use `Span(0, 0)`), and label validation
/// reports such spans instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A cell reference inside tabular content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableCell {
    pub row: usize,
    pub col: usize,
}

/// Something whose containment can be checked against a [`Span`] or a
/// [`TableCell`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Probe<'a> {
    Int(i64),
    Float(f64),
    /// A string holding an integer literal, e.g. `"10"`.
    Text(&'a str),
    Span(Span),
    Cell(TableCell),
}

impl Span {
    /// Creates a new span.
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of characters covered by the span.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span covers no characters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Checks whether a position or another span lies within this span.
    ///
    /// Scalars are contained when `start <= x < end`. Floats are truncated
    /// toward zero and strings must hold an integer literal. A nested span
    /// must start at or after `start` and end strictly before `end`, so a
    /// span is never contained in itself.
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidProbe`] for non-numeric strings,
    /// non-finite floats and table cells.
    pub fn contains<'a>(&self, probe: impl Into<Probe<'a>>) -> Result<bool, SchemaError> {
        match probe.into() {
            Probe::Int(x) => Ok(self.contains_position(x)),
            Probe::Float(x) => {
                if !x.is_finite() {
                    return Err(SchemaError::InvalidProbe(format!("non-finite value {}", x)));
                }
                let x = x.trunc();
                Ok(x >= self.start as f64 && x < self.end as f64)
            }
            Probe::Text(s) => {
                let x = s.trim().parse::<i64>().map_err(|_| {
                    SchemaError::InvalidProbe(format!("'{}': not an integer position", s))
                })?;
                Ok(self.contains_position(x))
            }
            Probe::Span(other) => Ok(self.start <= other.start && self.end > other.end),
            Probe::Cell(cell) => Err(SchemaError::InvalidProbe(format!(
                "table cell {} against a character span",
                cell
            ))),
        }
    }

    fn contains_position(&self, x: i64) -> bool {
        usize::try_from(x)
            .map(|x| self.start <= x && x < self.end)
            .unwrap_or(false)
    }
}

impl TableCell {
    /// Creates a new cell reference.
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// A cell contains only an identical cell.
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidProbe`] for anything other than a cell.
    pub fn contains<'a>(&self, probe: impl Into<Probe<'a>>) -> Result<bool, SchemaError> {
        match probe.into() {
            Probe::Cell(other) => Ok(*self == other),
            other => Err(SchemaError::InvalidProbe(format!(
                "{:?} against table cell {}",
                other, self
            ))),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({}, {})", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

impl fmt::Debug for TableCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableCell({}, {})", self.row, self.col)
    }
}

impl fmt::Display for TableCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(row {}, col {})", self.row, self.col)
    }
}

impl From<i64> for Probe<'_> {
    fn from(x: i64) -> Self {
        Probe::Int(x)
    }
}

impl From<i32> for Probe<'_> {
    fn from(x: i32) -> Self {
        Probe::Int(x.into())
    }
}

impl From<usize> for Probe<'_> {
    fn from(x: usize) -> Self {
        i64::try_from(x).map(Probe::Int).unwrap_or(Probe::Float(x as f64))
    }
}

impl From<f64> for Probe<'_> {
    fn from(x: f64) -> Self {
        Probe::Float(x)
    }
}

impl<'a> From<&'a str> for Probe<'a> {
    fn from(s: &'a str) -> Self {
        Probe::Text(s)
    }
}

impl From<Span> for Probe<'_> {
    fn from(span: Span) -> Self {
        Probe::Span(span)
    }
}

impl From<TableCell> for Probe<'_> {
    fn from(cell: TableCell) -> Self {
        Probe::Cell(cell)
    }
}

/// An answer position: a character span or a table cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Offset {
    Span(Span),
    Cell(TableCell),
}

impl Offset {
    /// Returns the span, if this offset is one.
    pub fn as_span(&self) -> Option<&Span> {
        match self {
            Offset::Span(span) => Some(span),
            Offset::Cell(_) => None,
        }
    }

    /// Returns the cell, if this offset is one.
    pub fn as_cell(&self) -> Option<&TableCell> {
        match self {
            Offset::Cell(cell) => Some(cell),
            Offset::Span(_) => None,
        }
    }

    /// Containment check delegated to the underlying span or cell.
    pub fn contains<'a>(&self, probe: impl Into<Probe<'a>>) -> Result<bool, SchemaError> {
        match self {
            Offset::Span(span) => span.contains(probe),
            Offset::Cell(cell) => cell.contains(probe),
        }
    }

    /// The plain `{start, end}` or `{row, col}` mapping.
    pub fn to_map(&self) -> Value {
        match self {
            Offset::Span(span) => json!({ "start": span.start, "end": span.end }),
            Offset::Cell(cell) => json!({ "row": cell.row, "col": cell.col }),
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Span(span) => fmt::Display::fmt(span, f),
            Offset::Cell(cell) => fmt::Display::fmt(cell, f),
        }
    }
}

impl From<Span> for Offset {
    fn from(span: Span) -> Self {
        Offset::Span(span)
    }
}

impl From<TableCell> for Offset {
    fn from(cell: TableCell) -> Self {
        Offset::Cell(cell)
    }
}

impl TryFrom<&Value> for Offset {
    type Error = SchemaError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Offset::deserialize(value).map_err(|e| SchemaError::InvalidOffset(e.to_string()))
    }
}

impl Serialize for Offset {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Offset::Span(span) => span.serialize(serializer),
            Offset::Cell(cell) => cell.serialize(serializer),
        }
    }
}

// The variant is picked from the keys present, checked once.
impl<'de> Deserialize<'de> for Offset {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct RawOffset {
            start: Option<usize>,
            end: Option<usize>,
            row: Option<usize>,
            col: Option<usize>,
        }

        let raw = RawOffset::deserialize(deserializer)?;
        match raw {
            RawOffset {
                start: Some(start),
                end: Some(end),
                row: None,
                col: None,
            } => Ok(Offset::Span(Span::new(start, end))),
            RawOffset {
                start: None,
                end: None,
                row: Some(row),
                col: Some(col),
            } => Ok(Offset::Cell(TableCell::new(row, col))),
            _ => Err(serde::de::Error::custom(
                "offset must have either 'start' and 'end' or 'row' and 'col'",
            )),
        }
    }
}
