//! Discrete character matrices as used in phylogenetics.
//!
//! A [`CharacterMatrix`] maps taxon labels to sequences of character states
//! and is tagged with a [`DataType`] that fixes its state alphabet. It is
//! built from `{label: sequence}` pairs or read from PHYLIP/FASTA text, and
//! serialized back to PHYLIP, FASTA or NEXUS.
//!
//! Symbol validation happens here, at construction, not in the converter.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CharmError, Result};
use crate::formats::nexus::{parse_nexus_str, write_nexus, NexusFormat};
use crate::formats::phylip::{parse_phylip_str, write_phylip, PhylipStyle};
use crate::formats::{fasta, ParseError};
use crate::model::{Sequence, SequenceSet};

/// Gap symbol shared by all data types.
pub const GAP: char = '-';
/// Missing-data symbol shared by all data types.
pub const MISSING: char = '?';

/// Kind of character data held by a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Dna,
    Rna,
    Protein,
    /// Arbitrary discrete states such as morphological codes.
    Standard,
}

impl DataType {
    pub const ALL: [DataType; 4] = [
        DataType::Dna,
        DataType::Rna,
        DataType::Protein,
        DataType::Standard,
    ];

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Dna => "dna",
            DataType::Rna => "rna",
            DataType::Protein => "protein",
            DataType::Standard => "standard",
        }
    }

    /// Upper-case state symbols, gap and missing excluded.
    pub fn alphabet(&self) -> &'static str {
        match self {
            DataType::Dna => "ACGTRYMKWSBDHVN",
            DataType::Rna => "ACGURYMKWSBDHVN",
            DataType::Protein => "ACDEFGHIKLMNPQRSTVWYBZXJUO*",
            DataType::Standard => "0123456789",
        }
    }

    /// Returns true if `symbol` is a state, gap or missing symbol of this type.
    pub fn is_valid_symbol(&self, symbol: char) -> bool {
        symbol == GAP
            || symbol == MISSING
            || self.alphabet().contains(symbol.to_ascii_uppercase())
    }

    /// Symbol written for a cell with no recorded state.
    pub fn missing_symbol(&self) -> char {
        MISSING
    }

    fn nexus_datatype(&self) -> &'static str {
        match self {
            DataType::Dna => "DNA",
            DataType::Rna => "RNA",
            DataType::Protein => "PROTEIN",
            DataType::Standard => "STANDARD",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = CharmError;

    fn from_str(s: &str) -> Result<Self> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                CharmError::invalid_argument(
                    "data type",
                    s,
                    &DataType::ALL.map(|dt| dt.name()),
                )
            })
    }
}

/// Text layout for [`CharacterMatrix::as_string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixFormat {
    /// Relaxed sequential PHYLIP
    Phylip,
    Fasta,
    Nexus,
}

/// A character matrix keyed by taxon label and position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterMatrix {
    data_type: DataType,
    taxa: IndexMap<String, Vec<char>>,
}

impl CharacterMatrix {
    /// Builds a matrix from `{label: sequence}` pairs.
    ///
    /// Every symbol must belong to the data type's alphabet and all
    /// sequences must have the same length.
    pub fn from_dict<I, K, V>(data_type: DataType, mapping: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut taxa: IndexMap<String, Vec<char>> = IndexMap::new();
        let mut nchar: Option<usize> = None;

        for (label, sequence) in mapping {
            let label = label.into();
            let mut states = Vec::with_capacity(sequence.as_ref().len());
            for (position, symbol) in sequence.as_ref().chars().enumerate() {
                if !data_type.is_valid_symbol(symbol) {
                    return Err(CharmError::InvalidSymbol {
                        taxon: label,
                        position,
                        symbol,
                        data_type: data_type.to_string(),
                    });
                }
                states.push(symbol);
            }

            match nchar {
                None => nchar = Some(states.len()),
                Some(n) if n != states.len() => {
                    return Err(CharmError::Shape {
                        context: format!("Taxon '{}'", label),
                        expected: n,
                        found: states.len(),
                    });
                }
                Some(_) => {}
            }

            if taxa.contains_key(&label) {
                return Err(CharmError::DuplicateColumn(label));
            }
            taxa.insert(label, states);
        }

        Ok(Self { data_type, taxa })
    }

    /// Builds a matrix from parsed sequence records.
    pub fn from_sequence_set(data_type: DataType, set: &SequenceSet) -> Result<Self> {
        Self::from_dict(data_type, set.pairs())
    }

    /// Reads a matrix from PHYLIP text (sequential or interleaved).
    pub fn from_phylip_str(data_type: DataType, content: &str) -> Result<Self> {
        let set = parse_phylip_str(content).map_err(ParseError::from)?;
        Self::from_sequence_set(data_type, &set)
    }

    /// Reads a matrix from FASTA text.
    pub fn from_fasta_str(data_type: DataType, content: &str) -> Result<Self> {
        let set = fasta::parse_fasta_str(content).map_err(ParseError::from)?;
        Self::from_sequence_set(data_type, &set)
    }

    /// Reads a matrix from the first DATA or CHARACTERS block of NEXUS text.
    ///
    /// The block's own DATATYPE is not consulted; symbols are checked
    /// against `data_type`.
    pub fn from_nexus_str(data_type: DataType, content: &str) -> Result<Self> {
        let set = parse_nexus_str(content).map_err(ParseError::from)?;
        Self::from_sequence_set(data_type, &set)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the number of taxa.
    pub fn ntax(&self) -> usize {
        self.taxa.len()
    }

    /// Returns the number of characters per taxon.
    pub fn nchar(&self) -> usize {
        self.taxa.values().next().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.taxa.is_empty()
    }

    /// Returns taxon labels in matrix order.
    pub fn taxa(&self) -> impl Iterator<Item = &str> {
        self.taxa.keys().map(String::as_str)
    }

    /// Returns the states of one taxon.
    pub fn sequence(&self, label: &str) -> Option<&[char]> {
        self.taxa.get(label).map(Vec::as_slice)
    }

    /// Returns the state of `label` at `position`.
    pub fn state(&self, label: &str, position: usize) -> Option<char> {
        self.taxa.get(label)?.get(position).copied()
    }

    /// Iterates over `(label, states)` in matrix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[char])> {
        self.taxa.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Distinct state symbols used in the matrix, gap and missing excluded.
    pub fn state_symbols(&self) -> BTreeSet<char> {
        self.taxa
            .values()
            .flatten()
            .copied()
            .filter(|&c| c != GAP && c != MISSING)
            .collect()
    }

    /// Converts the matrix to plain sequence records.
    pub fn to_sequence_set(&self) -> SequenceSet {
        self.iter()
            .map(|(label, states)| Sequence::new(label, states.iter().collect::<String>()))
            .collect()
    }

    /// Serializes the matrix.
    pub fn as_string(&self, format: MatrixFormat) -> String {
        let set = self.to_sequence_set();
        match format {
            MatrixFormat::Phylip => write_phylip(&set, PhylipStyle::Relaxed),
            MatrixFormat::Fasta => fasta::write_fasta(&set, None),
            MatrixFormat::Nexus => {
                let mut nexus = NexusFormat::new(self.data_type.nexus_datatype());
                if self.data_type == DataType::Standard {
                    let symbols: Vec<String> =
                        self.state_symbols().iter().map(char::to_string).collect();
                    nexus = nexus.with_symbols(symbols.join(" "));
                }
                write_nexus(&set, &nexus)
            }
        }
    }
}
