//! Raw sequence records shared by the format readers and writers.
//!
//! A [`SequenceSet`] is what a text format yields before it is given a
//! meaning: an ordered list of `(identifier, sequence)` pairs. Character
//! matrices and alignment objects are both built from it.

/// Represents a single sequence with its identifier and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// The sequence identifier (FASTA header without '>', PHYLIP name)
    pub id: String,
    /// One symbol per alignment position
    pub data: String,
}

impl Sequence {
    /// Creates a new sequence.
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
        }
    }

    /// Returns the number of positions in the sequence.
    pub fn len(&self) -> usize {
        self.data.chars().count()
    }

    /// Returns true if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the sequence data as a string slice.
    pub fn as_str(&self) -> &str {
        &self.data
    }
}

/// An ordered collection of sequences read from, or written to, a text format.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceSet {
    /// All sequences, in file order
    pub sequences: Vec<Sequence>,
}

impl SequenceSet {
    /// Creates a set from a vector of sequences.
    pub fn new(sequences: Vec<Sequence>) -> Self {
        Self { sequences }
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Returns true if the set holds no sequences.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Gets a sequence by index.
    pub fn get(&self, index: usize) -> Option<&Sequence> {
        self.sequences.get(index)
    }

    /// Returns the common sequence length, or `None` when lengths differ.
    ///
    /// An empty set is rectangular with length 0.
    pub fn common_length(&self) -> Option<usize> {
        let Some(first) = self.sequences.first() else {
            return Some(0);
        };
        let first_len = first.len();
        self.sequences
            .iter()
            .all(|s| s.len() == first_len)
            .then_some(first_len)
    }

    /// Returns `(min, max)` sequence lengths, for diagnostics.
    pub fn length_range(&self) -> (usize, usize) {
        let min_len = self.sequences.iter().map(Sequence::len).min().unwrap_or(0);
        let max_len = self.sequences.iter().map(Sequence::len).max().unwrap_or(0);
        (min_len, max_len)
    }

    /// Iterates over `(id, data)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sequences.iter().map(|s| (s.id.as_str(), s.as_str()))
    }
}

impl FromIterator<Sequence> for SequenceSet {
    fn from_iter<I: IntoIterator<Item = Sequence>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_creation() {
        let seq = Sequence::new("seq1", "ACGT");
        assert_eq!(seq.id, "seq1");
        assert_eq!(seq.as_str(), "ACGT");
        assert_eq!(seq.len(), 4);
    }

    #[test]
    fn test_rectangular_set() {
        let set = SequenceSet::new(vec![
            Sequence::new("seq1", "ACGT"),
            Sequence::new("seq2", "TGCA"),
        ]);
        assert_eq!(set.common_length(), Some(4));
        assert_eq!(set.length_range(), (4, 4));
    }

    #[test]
    fn test_ragged_set() {
        let set = SequenceSet::new(vec![
            Sequence::new("seq1", "ACGT"),
            Sequence::new("seq2", "TG"),
        ]);
        assert_eq!(set.common_length(), None);
        assert_eq!(set.length_range(), (2, 4));
    }

    #[test]
    fn test_empty_set_is_rectangular() {
        assert_eq!(SequenceSet::default().common_length(), Some(0));
    }
}
