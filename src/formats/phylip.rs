//! PHYLIP format reader and writer.
//!
//! Reads both sequential and interleaved PHYLIP; writes sequential PHYLIP
//! in either the relaxed or the strict (10-character name) flavour.
//!
//! ## PHYLIP Format
//!
//! The first line contains the number of sequences and the sequence length:
//! ```text
//!  3 10
//! ```
//!
//! ### Sequential Format
//! Each sequence name (10 chars, padded) followed by all its data:
//! ```text
//!  3 10
//! Seq1      ACGTACGTAC
//! Seq2      TGCATGCATG
//! Seq3      AAAACCCCGG
//! ```
//!
//! ### Interleaved Format
//! Names on first block, then data continues in subsequent blocks:
//! ```text
//!  3 20
//! Seq1      ACGTACGTAC
//! Seq2      TGCATGCATG
//! Seq3      AAAACCCCGG
//!
//! GTGTGTGTGT
//! CACACACACA
//! TTTTTTTTTT
//! ```
//!
//! ### Relaxed Format
//! Names of any length, separated from the data by whitespace:
//! ```text
//! 3 5
//! t1  TCCAA
//! t2  TGCAA
//! t3  TG-AA
//! ```

use std::fmt::Write as _;

use thiserror::Error;

use crate::model::{Sequence, SequenceSet};

/// Errors that can occur during PHYLIP parsing.
#[derive(Error, Debug)]
pub enum PhylipError {
    #[error("Empty PHYLIP file")]
    EmptyFile,

    #[error("Invalid header: expected 'ntax nchar' (two integers), got '{0}'")]
    InvalidHeader(String),

    #[error("Invalid sequence count in header: '{0}' is not a valid number")]
    InvalidSequenceCount(String),

    #[error("Invalid sequence length in header: '{0}' is not a valid number")]
    InvalidSequenceLength(String),

    #[error("Expected {expected} sequences but found {found}")]
    SequenceCountMismatch { expected: usize, found: usize },

    #[error("Sequence '{name}' has length {found}, expected {expected}")]
    SequenceLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("No sequence data found after header")]
    NoSequenceData,
}

/// Result type for PHYLIP operations.
pub type PhylipResult<T> = Result<T, PhylipError>;

/// Name layout used when writing PHYLIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhylipStyle {
    /// Full names followed by two spaces.
    #[default]
    Relaxed,
    /// Names truncated or padded to 10 characters, data in blocks of 10.
    Strict,
}

const STRICT_NAME_WIDTH: usize = 10;
const STRICT_BLOCK: usize = 10;

/// Parses PHYLIP content from a string.
pub fn parse_phylip_str(content: &str) -> PhylipResult<SequenceSet> {
    let lines: Vec<&str> = content.lines().collect();

    // Find the header line (first non-empty line)
    let (header_idx, header) = lines
        .iter()
        .enumerate()
        .find(|(_, line)| !line.trim().is_empty())
        .ok_or(PhylipError::EmptyFile)?;

    let header = header.trim();
    let parts: Vec<&str> = header.split_whitespace().collect();

    if parts.len() < 2 {
        return Err(PhylipError::InvalidHeader(header.to_string()));
    }

    let ntax: usize = parts[0]
        .parse()
        .map_err(|_| PhylipError::InvalidSequenceCount(parts[0].to_string()))?;

    let nchar: usize = parts[1]
        .parse()
        .map_err(|_| PhylipError::InvalidSequenceLength(parts[1].to_string()))?;

    if ntax == 0 {
        return Err(PhylipError::InvalidSequenceCount("0".to_string()));
    }

    // Keep empty lines: they separate interleaved blocks
    let data_lines: Vec<&str> = lines.iter().skip(header_idx + 1).copied().collect();

    if data_lines.iter().all(|l| l.trim().is_empty()) {
        return Err(PhylipError::NoSequenceData);
    }

    let sequences = parse_phylip_data(&data_lines, ntax, nchar)?;

    if sequences.len() != ntax {
        return Err(PhylipError::SequenceCountMismatch {
            expected: ntax,
            found: sequences.len(),
        });
    }
    if let Some(bad) = sequences.iter().find(|s| s.len() != nchar) {
        return Err(PhylipError::SequenceLengthMismatch {
            name: bad.id.clone(),
            expected: nchar,
            found: bad.len(),
        });
    }

    Ok(SequenceSet::new(sequences))
}

/// Splits a line into name and sequence parts.
///
/// Handles both strict PHYLIP (10-char names) and relaxed formats. When the
/// two layouts disagree, the one whose data has the declared `nchar` length
/// wins; otherwise the relaxed split is preferred.
fn split_name_and_sequence(line: &str, nchar: usize) -> (Option<String>, String) {
    let line = line.trim();

    if line.is_empty() {
        return (None, String::new());
    }

    let relaxed = split_relaxed(line);
    let strict = split_strict(line);

    let full_length = |split: &Option<(String, String)>| {
        split
            .as_ref()
            .is_some_and(|(_, seq)| seq.chars().count() == nchar)
    };
    let chosen = if full_length(&relaxed) {
        relaxed
    } else if full_length(&strict) {
        strict
    } else {
        relaxed.or(strict)
    };
    if let Some((name, seq)) = chosen {
        return (Some(name), seq);
    }

    // Continuation line: sequence data only
    let seq: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    if seq.chars().all(is_sequence_char) {
        return (None, seq);
    }

    (Some(line.to_string()), String::new())
}

/// Relaxed: whitespace-separated name and sequence.
fn split_relaxed(line: &str) -> Option<(String, String)> {
    let space_idx = line.find(char::is_whitespace)?;
    let name = line[..space_idx].trim();
    let seq: String = line[space_idx..]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    (!name.is_empty() && !seq.is_empty() && seq.chars().all(is_sequence_char))
        .then(|| (name.to_string(), seq))
}

/// Strict: name is exactly the first 10 chars, padded with spaces.
fn split_strict(line: &str) -> Option<(String, String)> {
    if line.len() < STRICT_NAME_WIDTH || !line.is_char_boundary(STRICT_NAME_WIDTH) {
        return None;
    }
    let (potential_name, potential_seq) = line.split_at(STRICT_NAME_WIDTH);
    let name = potential_name.trim();
    let seq: String = potential_seq
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    (name.split_whitespace().count() == 1
        && !seq.is_empty()
        && seq.chars().all(is_sequence_char))
    .then(|| (name.to_string(), seq))
}

/// Checks if a character can appear in sequence data.
///
/// Digits are state symbols of standard (morphological) matrices.
fn is_sequence_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '*' | '?')
}

/// Parses PHYLIP data lines. Handles both sequential and interleaved formats.
fn parse_phylip_data(lines: &[&str], ntax: usize, nchar: usize) -> PhylipResult<Vec<Sequence>> {
    let mut sequences: Vec<(String, String)> = Vec::with_capacity(ntax);
    let mut in_interleaved_continuation = false;
    let mut interleaved_idx = 0;

    for line in lines {
        let trimmed = line.trim();

        // Empty line indicates block boundary in interleaved format
        if trimmed.is_empty() {
            if sequences.len() == ntax {
                in_interleaved_continuation = true;
                interleaved_idx = 0;
            }
            continue;
        }

        if in_interleaved_continuation {
            // Continuation blocks carry no names
            let seq: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
            if let Some((_, data)) = sequences.get_mut(interleaved_idx) {
                data.push_str(&seq);
                interleaved_idx += 1;
            }
        } else {
            let (name, seq) = split_name_and_sequence(trimmed, nchar);
            match name {
                Some(n) if sequences.len() < ntax => sequences.push((n, seq)),
                Some(n) => {
                    if let Some(pos) = sequences.iter().position(|(sn, _)| sn == &n) {
                        sequences[pos].1.push_str(&seq);
                    }
                }
                None => {
                    if let Some((_, data)) = sequences.last_mut() {
                        data.push_str(&seq);
                    }
                }
            }
        }

        if sequences.len() == ntax
            && nchar > 0
            && sequences.iter().all(|(_, data)| data.chars().count() >= nchar)
        {
            break;
        }
    }

    if sequences.is_empty() {
        return Err(PhylipError::NoSequenceData);
    }

    Ok(sequences
        .into_iter()
        .map(|(name, data)| Sequence::new(name, data))
        .collect())
}

/// Writes a sequence set as sequential PHYLIP.
///
/// The header length is the length of the longest sequence.
pub fn write_phylip(set: &SequenceSet, style: PhylipStyle) -> String {
    let (_, nchar) = set.length_range();
    let mut out = String::new();

    match style {
        PhylipStyle::Relaxed => {
            let _ = writeln!(out, "{} {}", set.sequence_count(), nchar);
            for seq in &set.sequences {
                let _ = writeln!(out, "{}  {}", seq.id, seq.as_str());
            }
        }
        PhylipStyle::Strict => {
            let _ = writeln!(out, " {} {}", set.sequence_count(), nchar);
            for seq in &set.sequences {
                let name: String = seq.id.chars().take(STRICT_NAME_WIDTH).collect();
                let chars: Vec<char> = seq.as_str().chars().collect();
                let blocks: Vec<String> = chars
                    .chunks(STRICT_BLOCK)
                    .map(|block| block.iter().collect())
                    .collect();
                let _ = writeln!(
                    out,
                    "{:<width$}{}",
                    name,
                    blocks.join(" "),
                    width = STRICT_NAME_WIDTH
                );
            }
        }
    }

    out
}
