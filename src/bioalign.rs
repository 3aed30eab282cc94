//! Multiple sequence alignments as used by bioinformatics toolkits.
//!
//! A [`MultipleSeqAlignment`] is an ordered list of [`SeqRecord`]s sharing
//! one [`Alphabet`] tag. Records are appended one at a time and must all
//! have the same length.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CharmError, Result};
use crate::formats::fasta::write_fasta;
use crate::formats::phylip::{write_phylip, PhylipStyle};
use crate::model::{Sequence, SequenceSet};

/// Alphabet tag carried by sequences and alignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Alphabet {
    #[default]
    #[serde(rename = "generic_alphabet")]
    Generic,
    #[serde(rename = "single_letter_alphabet")]
    SingleLetter,
    #[serde(rename = "generic_nucleotide")]
    Nucleotide,
    #[serde(rename = "generic_dna")]
    Dna,
    #[serde(rename = "generic_rna")]
    Rna,
    #[serde(rename = "generic_protein")]
    Protein,
}

impl Alphabet {
    pub const ALL: [Alphabet; 6] = [
        Alphabet::Generic,
        Alphabet::SingleLetter,
        Alphabet::Nucleotide,
        Alphabet::Dna,
        Alphabet::Rna,
        Alphabet::Protein,
    ];

    /// Exact name accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Alphabet::Generic => "generic_alphabet",
            Alphabet::SingleLetter => "single_letter_alphabet",
            Alphabet::Nucleotide => "generic_nucleotide",
            Alphabet::Dna => "generic_dna",
            Alphabet::Rna => "generic_rna",
            Alphabet::Protein => "generic_protein",
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Alphabet {
    type Err = CharmError;

    fn from_str(s: &str) -> Result<Self> {
        Alphabet::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| {
                CharmError::invalid_argument("alphabet", s, &Alphabet::ALL.map(|a| a.name()))
            })
    }
}

/// Sequence data tagged with an alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seq {
    data: String,
    alphabet: Alphabet,
}

impl Seq {
    pub fn new(data: impl Into<String>, alphabet: Alphabet) -> Self {
        Self {
            data: data.into(),
            alphabet,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Returns the number of positions.
    pub fn len(&self) -> usize {
        self.data.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Display for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

/// A sequence with its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub id: String,
    pub seq: Seq,
}

impl SeqRecord {
    pub fn new(seq: Seq, id: impl Into<String>) -> Self {
        Self { id: id.into(), seq }
    }
}

/// Text layout for [`MultipleSeqAlignment::format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentFormat {
    /// Strict sequential PHYLIP (10-character names)
    Phylip,
    Fasta,
}

/// An ordered collection of equal-length records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultipleSeqAlignment {
    records: Vec<SeqRecord>,
    alphabet: Alphabet,
}

impl MultipleSeqAlignment {
    /// Creates an empty alignment.
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            records: Vec::new(),
            alphabet,
        }
    }

    /// Builds an alignment from records, appending them in order.
    pub fn from_records<I>(alphabet: Alphabet, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = SeqRecord>,
    {
        let mut alignment = Self::new(alphabet);
        for record in records {
            alignment.append(record)?;
        }
        Ok(alignment)
    }

    /// Builds an alignment from parsed sequence records.
    pub fn from_sequence_set(alphabet: Alphabet, set: &SequenceSet) -> Result<Self> {
        Self::from_records(
            alphabet,
            set.sequences
                .iter()
                .map(|s| SeqRecord::new(Seq::new(s.as_str(), alphabet), s.id.clone())),
        )
    }

    /// Appends a record; its length must match the existing records.
    pub fn append(&mut self, record: SeqRecord) -> Result<()> {
        if let Some(expected) = self.records.first().map(|r| r.seq.len()) {
            if record.seq.len() != expected {
                return Err(CharmError::Shape {
                    context: format!("Record '{}'", record.id),
                    expected,
                    found: record.seq.len(),
                });
            }
        }
        self.records.push(record);
        Ok(())
    }

    /// Sorts records by identifier.
    pub fn sort(&mut self) {
        self.records.sort_by(|a, b| a.id.cmp(&b.id));
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the common record length.
    pub fn alignment_length(&self) -> usize {
        self.records.first().map_or(0, |r| r.seq.len())
    }

    pub fn get(&self, index: usize) -> Option<&SeqRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SeqRecord> {
        self.records.iter()
    }

    /// Converts the alignment to plain sequence records.
    pub fn to_sequence_set(&self) -> SequenceSet {
        self.records
            .iter()
            .map(|r| Sequence::new(r.id.clone(), r.seq.as_str()))
            .collect()
    }

    /// Serializes the alignment.
    pub fn format(&self, format: AlignmentFormat) -> String {
        let set = self.to_sequence_set();
        match format {
            AlignmentFormat::Phylip => write_phylip(&set, PhylipStyle::Strict),
            AlignmentFormat::Fasta => write_fasta(&set, Some(60)),
        }
    }
}

impl<'a> IntoIterator for &'a MultipleSeqAlignment {
    type Item = &'a SeqRecord;
    type IntoIter = std::slice::Iter<'a, SeqRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
