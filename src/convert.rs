//! Conversions between tables, character matrices, alignments and
//! `{identifier: sequence}` mappings.
//!
//! Every conversion goes through [`Table`]:
//!
//! ```text
//! CharacterMatrix      ──from_charmatrix──▶            ──to_charmatrix──▶    CharacterMatrix
//! MultipleSeqAlignment ──from_bioalignment─▶  Table    ──to_bioalignment─▶   MultipleSeqAlignment
//! {id: sequence}       ──from_sequence_dict▶           ──to_sequence_dict▶   {id: sequence}
//! ```
//!
//! All functions read their input and return a fresh value; nothing is
//! mutated or shared. Exports do not check symbols against an alphabet:
//! [`CharacterMatrix::from_dict`] does that and reports its own error.

use indexmap::IndexMap;
use tracing::debug;

use crate::bioalign::{Alphabet, MultipleSeqAlignment, Seq, SeqRecord};
use crate::charmatrix::{CharacterMatrix, DataType};
use crate::error::{CharmError, Result};
use crate::table::{Column, Table};

fn normalize(table: Table, categorical: bool) -> Table {
    if categorical {
        table.as_categorical(&[])
    } else {
        table
    }
}

/// Reads a character matrix into a table, one column per taxon.
///
/// Columns follow the matrix's taxon order and rows its position order.
/// With `categorical`, each column's categories are its observed states.
pub fn from_charmatrix(matrix: &CharacterMatrix, categorical: bool) -> Table {
    let columns: IndexMap<String, Column> = matrix
        .iter()
        .map(|(label, states)| {
            let column = Column::from_symbols(states.iter().map(char::to_string));
            (label.to_string(), column)
        })
        .collect();
    debug!(
        ntax = matrix.ntax(),
        nchar = matrix.nchar(),
        data_type = %matrix.data_type(),
        "Read character matrix into table"
    );
    normalize(Table::from_rectangular(columns, matrix.nchar()), categorical)
}

/// Builds a character matrix of `data_type` from a table.
///
/// Each column becomes one taxon whose sequence is the column's values in
/// row order. Missing cells are written as the data type's missing symbol.
pub fn to_charmatrix(table: &Table, data_type: DataType) -> Result<CharacterMatrix> {
    let missing = data_type.missing_symbol().to_string();
    let sequences: Vec<(&str, String)> = table
        .iter()
        .map(|(label, column)| (label, column.concat_with(&missing)))
        .collect();
    debug!(
        ntax = table.ncols(),
        nchar = table.nrows(),
        %data_type,
        "Building character matrix from table"
    );
    CharacterMatrix::from_dict(data_type, sequences)
}

/// Reads an alignment into a categorical table, one column per record.
pub fn from_bioalignment(alignment: &MultipleSeqAlignment) -> Table {
    let columns: IndexMap<String, Column> = alignment
        .iter()
        .map(|record| (record.id.clone(), Column::from_sequence(record.seq.as_str())))
        .collect();
    debug!(
        records = alignment.len(),
        length = alignment.alignment_length(),
        "Read alignment into table"
    );
    Table::from_rectangular(columns, alignment.alignment_length()).as_categorical(&[])
}

/// Builds an alignment tagged with `alphabet` from a table.
///
/// Records are appended in column order, then sorted by identifier.
/// Fails with [`CharmError::MissingData`] if any cell is missing.
pub fn to_bioalignment(table: &Table, alphabet: Alphabet) -> Result<MultipleSeqAlignment> {
    let mut alignment = MultipleSeqAlignment::new(alphabet);
    for (label, column) in table.iter() {
        let data = concat_column(label, column)?;
        alignment.append(SeqRecord::new(Seq::new(data, alphabet), label))?;
    }
    alignment.sort();
    debug!(records = alignment.len(), %alphabet, "Built alignment from table");
    Ok(alignment)
}

/// Reads `{identifier: sequence}` pairs into a table, one character per row.
///
/// Columns follow the iteration order of `mapping`. All sequences must have
/// the same length.
pub fn from_sequence_dict<I, K, V>(mapping: I, categorical: bool) -> Result<Table>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let mut table = Table::new();
    for (id, sequence) in mapping {
        let id = id.into();
        let column = Column::from_sequence(sequence.as_ref());
        if !table.is_empty() && column.len() != table.nrows() {
            return Err(CharmError::Shape {
                context: format!("Sequence '{}'", id),
                expected: table.nrows(),
                found: column.len(),
            });
        }
        table.insert_column(id, column)?;
    }
    debug!(
        sequences = table.ncols(),
        length = table.nrows(),
        "Read sequence mapping into table"
    );
    Ok(normalize(table, categorical))
}

/// Flattens each column into a sequence string.
///
/// Fails with [`CharmError::MissingData`] if any cell is missing.
pub fn to_sequence_dict(table: &Table) -> Result<IndexMap<String, String>> {
    table
        .iter()
        .map(|(label, column)| Ok((label.to_string(), concat_column(label, column)?)))
        .collect()
}

fn concat_column(label: &str, column: &Column) -> Result<String> {
    column.concat().map_err(|position| CharmError::MissingData {
        column: label.to_string(),
        position,
    })
}
