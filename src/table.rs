//! Column-oriented character table.
//!
//! A [`Table`] is the shared intermediate of every conversion: one
//! [`Column`] per sequence identifier, one row per alignment position.
//! Row order is meaningful and always preserved; column order is kept for
//! iteration but does not take part in equality.
//!
//! Columns come in two modes:
//! - *plain*: values are unconstrained tokens
//! - *categorical*: the column also declares the finite set of symbols it
//!   may hold, kept sorted so exported matrices list symbols in a
//!   reproducible order
//!
//! Categories are metadata derived from the values. They are never kept in
//! sync eagerly; [`Table::as_categorical`] recomputes them on demand.

use std::collections::BTreeSet;
use std::io::Write;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CharmError, Result};

/// A single table cell. `None` is the missing-value marker.
pub type Cell = Option<String>;

/// One table column: the values of a sequence, position by position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ColumnRepr", into = "ColumnRepr")]
pub struct Column {
    values: Vec<Cell>,
    categories: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize)]
struct ColumnRepr {
    values: Vec<Cell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<String>>,
}

impl TryFrom<ColumnRepr> for Column {
    type Error = CharmError;

    fn try_from(repr: ColumnRepr) -> Result<Self> {
        match repr.categories {
            Some(categories) => Column::categorical(repr.values, categories),
            None => Ok(Column::plain(repr.values)),
        }
    }
}

impl From<Column> for ColumnRepr {
    fn from(column: Column) -> Self {
        ColumnRepr {
            values: column.values,
            categories: column.categories,
        }
    }
}

impl Column {
    /// Creates a plain column.
    pub fn plain(values: Vec<Cell>) -> Self {
        Self {
            values,
            categories: None,
        }
    }

    /// Creates a plain column with no missing values.
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::plain(symbols.into_iter().map(|s| Some(s.into())).collect())
    }

    /// Creates a plain column holding one value per character of `sequence`.
    pub fn from_sequence(sequence: &str) -> Self {
        Self::plain(sequence.chars().map(|c| Some(c.to_string())).collect())
    }

    /// Creates a categorical column.
    ///
    /// Categories are sorted and deduplicated. Every present value must be
    /// one of them; missing values are always allowed.
    pub fn categorical<I, S>(values: Vec<Cell>, categories: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories: BTreeSet<String> = categories.into_iter().map(Into::into).collect();
        for (position, value) in values.iter().enumerate() {
            if let Some(v) = value {
                if !categories.contains(v) {
                    return Err(CharmError::InvalidCategory {
                        value: v.clone(),
                        position,
                    });
                }
            }
        }
        Ok(Self {
            values,
            categories: Some(categories.into_iter().collect()),
        })
    }

    /// Returns the number of positions.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column has no positions.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the raw cells.
    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    /// Returns the value at `position`, `None` when missing or out of range.
    pub fn get(&self, position: usize) -> Option<&str> {
        self.values.get(position).and_then(|c| c.as_deref())
    }

    /// Returns the declared categories, `None` for a plain column.
    pub fn categories(&self) -> Option<&[String]> {
        self.categories.as_deref()
    }

    pub fn is_categorical(&self) -> bool {
        self.categories.is_some()
    }

    /// Returns true if any cell holds the missing-value marker.
    pub fn has_missing(&self) -> bool {
        self.values.iter().any(Option::is_none)
    }

    /// Returns the distinct present values, sorted.
    pub fn observed(&self) -> BTreeSet<&str> {
        self.values.iter().filter_map(|c| c.as_deref()).collect()
    }

    /// Concatenates the values in row order, substituting `missing` for
    /// missing cells.
    pub fn concat_with(&self, missing: &str) -> String {
        self.values
            .iter()
            .map(|c| c.as_deref().unwrap_or(missing))
            .collect()
    }

    /// Concatenates the values in row order.
    ///
    /// Returns the position of the first missing cell on failure.
    pub fn concat(&self) -> std::result::Result<String, usize> {
        let mut out = String::with_capacity(self.values.len());
        for (position, value) in self.values.iter().enumerate() {
            match value {
                Some(v) => out.push_str(v),
                None => return Err(position),
            }
        }
        Ok(out)
    }

    fn recategorized(&self, extra_values: &[&str]) -> Column {
        let mut categories = self.observed();
        categories.extend(extra_values.iter().copied());
        Column {
            values: self.values.clone(),
            categories: Some(categories.into_iter().map(str::to_string).collect()),
        }
    }

    fn to_plain(&self) -> Column {
        Column::plain(self.values.clone())
    }
}

/// Rectangular table of character states indexed by sequence identifier
/// (columns) and position (rows).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableRepr", into = "TableRepr")]
pub struct Table {
    columns: IndexMap<String, Column>,
    nrows: usize,
}

#[derive(Serialize, Deserialize)]
struct TableRepr {
    columns: IndexMap<String, Column>,
}

impl TryFrom<TableRepr> for Table {
    type Error = CharmError;

    fn try_from(repr: TableRepr) -> Result<Self> {
        Table::from_columns(repr.columns)
    }
}

impl From<Table> for TableRepr {
    fn from(table: Table) -> Self {
        TableRepr {
            columns: table.columns,
        }
    }
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(label, column)` pairs.
    pub fn from_columns<I, K>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Column)>,
        K: Into<String>,
    {
        let mut table = Table::new();
        for (label, column) in columns {
            table.insert_column(label, column)?;
        }
        Ok(table)
    }

    /// Builds a table from columns already known to share `nrows`.
    pub(crate) fn from_rectangular(columns: IndexMap<String, Column>, nrows: usize) -> Self {
        debug_assert!(columns.values().all(|c| c.len() == nrows));
        Self { columns, nrows }
    }

    /// Appends a column.
    ///
    /// The first column fixes the row count; every later column must match it.
    pub fn insert_column(&mut self, label: impl Into<String>, column: Column) -> Result<()> {
        let label = label.into();
        if self.columns.contains_key(&label) {
            return Err(CharmError::DuplicateColumn(label));
        }
        if self.columns.is_empty() {
            self.nrows = column.len();
        } else if column.len() != self.nrows {
            return Err(CharmError::Shape {
                context: format!("Column '{}'", label),
                expected: self.nrows,
                found: column.len(),
            });
        }
        self.columns.insert(label, column);
        Ok(())
    }

    /// Returns the number of positions (rows).
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Returns the number of sequences (columns).
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the column labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, label: &str) -> Option<&Column> {
        self.columns.get(label)
    }

    /// Returns the value at (`label`, `position`), `None` when missing.
    ///
    /// Fails on an unknown label or a position past the last row.
    pub fn get(&self, label: &str, position: usize) -> Result<Option<&str>> {
        let column = self
            .columns
            .get(label)
            .ok_or_else(|| CharmError::UnknownColumn(label.to_string()))?;
        if position >= self.nrows {
            return Err(CharmError::PositionOutOfRange {
                column: label.to_string(),
                position,
                nrows: self.nrows,
            });
        }
        Ok(column.get(position))
    }

    /// Returns the cells of one position across all columns.
    pub fn row(&self, position: usize) -> Option<Vec<Option<&str>>> {
        (position < self.nrows).then(|| {
            self.columns
                .values()
                .map(|column| column.get(position))
                .collect()
        })
    }

    /// Iterates over `(label, column)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if every column is categorical.
    pub fn is_categorical(&self) -> bool {
        self.columns.values().all(Column::is_categorical)
    }

    /// Returns a copy where each column's categories are the union of its
    /// observed values and `extra_values`, sorted.
    ///
    /// Values are left untouched.
    pub fn as_categorical(&self, extra_values: &[&str]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|(label, column)| (label.clone(), column.recategorized(extra_values)))
                .collect(),
            nrows: self.nrows,
        }
    }

    /// Returns a copy with all category metadata dropped.
    pub fn as_object(&self) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|(label, column)| (label.clone(), column.to_plain()))
                .collect(),
            nrows: self.nrows,
        }
    }

    /// Writes the table as CSV: a header row of labels, then one record per
    /// position. Missing values are written as empty fields.
    pub fn to_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.labels())?;
        for position in 0..self.nrows {
            wtr.write_record(
                self.columns
                    .values()
                    .map(|column| column.get(position).unwrap_or("")),
            )?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cells(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    fn category_frame() -> Table {
        let columns = [
            ("t1", ["T", "G", "C", "A", "?"]),
            ("t2", ["T", "G", "C", "A", "A"]),
            ("t3", ["T", "G", "C", "A", "A"]),
            ("t4", ["T", "G", "C", "A", "A"]),
        ];
        Table::from_columns(columns.iter().map(|(label, values)| {
            (*label, Column::from_symbols(values.iter().copied()))
        }))
        .unwrap()
        .as_categorical(&[])
    }

    #[test]
    fn test_categories_are_sorted_observed_values() {
        let frame = category_frame();
        let t1 = frame.column("t1").unwrap();
        assert_eq!(t1.categories().unwrap(), &["?", "A", "C", "G", "T"]);
        let t2 = frame.column("t2").unwrap();
        assert_eq!(t2.categories().unwrap(), &["A", "C", "G", "T"]);
    }

    #[test]
    fn test_altered_categories() {
        let frame = Table::from_columns([(
            "t2",
            Column::categorical(cells(&["T", "G", "C", "A", "A"]), ["A", "C", "G", "T", "?"])
                .unwrap(),
        )])
        .unwrap();
        let recomputed = frame.as_categorical(&[]);
        assert_ne!(
            recomputed.column("t2").unwrap().categories(),
            frame.column("t2").unwrap().categories()
        );
        assert_eq!(recomputed.column("t2").unwrap().values(), frame.column("t2").unwrap().values());
    }

    #[test]
    fn test_add_category() {
        let frame = category_frame().as_categorical(&["-"]);
        assert_eq!(
            frame.column("t1").unwrap().categories().unwrap(),
            &["-", "?", "A", "C", "G", "T"]
        );
    }

    #[test]
    fn test_missing_is_never_a_category() {
        let column = Column::plain(vec![Some("A".into()), None, Some("C".into())]);
        let table = Table::from_columns([("t1", column)]).unwrap().as_categorical(&[]);
        assert_eq!(table.column("t1").unwrap().categories().unwrap(), &["A", "C"]);
        assert!(table.column("t1").unwrap().has_missing());
    }

    #[test]
    fn test_as_object_drops_categories() {
        let frame = category_frame();
        let plain = frame.as_object();
        assert!(!plain.column("t1").unwrap().is_categorical());
        assert_eq!(plain.column("t1").unwrap().values(), frame.column("t1").unwrap().values());
        assert_eq!(plain.as_categorical(&[]), frame);
    }

    #[test]
    fn test_categorical_rejects_undeclared_value() {
        let result = Column::categorical(cells(&["A", "X"]), ["A", "C"]);
        assert!(matches!(
            result,
            Err(CharmError::InvalidCategory { position: 1, .. })
        ));
    }

    #[test]
    fn test_ragged_column_rejected() {
        let mut table = Table::new();
        table.insert_column("t1", Column::from_sequence("ACGT")).unwrap();
        let err = table.insert_column("t2", Column::from_sequence("AC")).unwrap_err();
        assert!(matches!(err, CharmError::Shape { expected: 4, found: 2, .. }));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let mut table = Table::new();
        table.insert_column("t1", Column::from_sequence("AC")).unwrap();
        assert!(matches!(
            table.insert_column("t1", Column::from_sequence("GT")),
            Err(CharmError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_equality_ignores_column_order() {
        let a = Table::from_columns([
            ("t1", Column::from_sequence("AC")),
            ("t2", Column::from_sequence("GT")),
        ])
        .unwrap();
        let b = Table::from_columns([
            ("t2", Column::from_sequence("GT")),
            ("t1", Column::from_sequence("AC")),
        ])
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_get_and_row() {
        let table = Table::from_columns([
            ("t1", Column::from_sequence("TCCAA")),
            ("t3", Column::from_sequence("TG-AA")),
        ])
        .unwrap();
        assert_eq!(table.get("t3", 2).unwrap(), Some("-"));
        assert_eq!(table.row(1).unwrap(), vec![Some("C"), Some("G")]);
        assert!(table.row(5).is_none());
        assert!(matches!(table.get("t9", 0), Err(CharmError::UnknownColumn(_))));
        assert!(matches!(
            table.get("t1", 5),
            Err(CharmError::PositionOutOfRange { position: 5, nrows: 5, .. })
        ));
    }

    #[test]
    fn test_to_csv() {
        let table = Table::from_columns([
            ("t1", Column::from_sequence("AC")),
            ("t2", Column::plain(vec![Some("G".into()), None])),
        ])
        .unwrap();
        let mut out = Vec::new();
        table.to_csv(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "t1,t2\nA,G\nC,\n");
    }

    #[test]
    fn test_json_roundtrip_keeps_categories() {
        let frame = category_frame();
        let json = serde_json::to_string(&frame).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_json_rejects_ragged_table() {
        let json = r#"{"columns":{"t1":{"values":["A","C"]},"t2":{"values":["A"]}}}"#;
        assert!(serde_json::from_str::<Table>(json).is_err());
    }
}
