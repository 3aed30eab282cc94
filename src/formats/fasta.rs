//! FASTA reader and writer.
//!
//! Handles both single-line and multi-line sequences.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional description
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```

use std::fmt::Write as _;

use thiserror::Error;

use crate::model::{Sequence, SequenceSet};

/// Errors that can occur during FASTA parsing.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Empty FASTA file")]
    EmptyFile,

    #[error("Invalid FASTA format: {0}")]
    InvalidFormat(String),

    #[error("Sequence without header at line {0}")]
    SequenceWithoutHeader(usize),
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

/// Incremental record builder, fed one line at a time.
#[derive(Default)]
struct FastaBuilder {
    sequences: Vec<Sequence>,
    current_id: Option<String>,
    current_seq: String,
}

impl FastaBuilder {
    fn push_line(&mut self, line: &str, line_number: usize) -> FastaResult<()> {
        let line = line.trim();

        if line.is_empty() {
            return Ok(());
        }

        if let Some(header) = line.strip_prefix('>') {
            self.finish_record();

            // Take everything before the first space as ID
            let id = header.split_whitespace().next().unwrap_or(header);
            if id.is_empty() {
                return Err(FastaError::InvalidFormat(format!(
                    "Empty sequence identifier at line {}",
                    line_number
                )));
            }
            self.current_id = Some(id.to_string());
        } else {
            if self.current_id.is_none() {
                return Err(FastaError::SequenceWithoutHeader(line_number));
            }
            self.current_seq
                .extend(line.chars().filter(|c| !c.is_whitespace()));
        }
        Ok(())
    }

    fn finish_record(&mut self) {
        if let Some(id) = self.current_id.take() {
            self.sequences
                .push(Sequence::new(id, std::mem::take(&mut self.current_seq)));
        }
    }

    fn finish(mut self) -> FastaResult<SequenceSet> {
        self.finish_record();
        if self.sequences.is_empty() {
            return Err(FastaError::EmptyFile);
        }
        Ok(SequenceSet::new(self.sequences))
    }
}

/// Parses FASTA content from a string.
pub fn parse_fasta_str(content: &str) -> FastaResult<SequenceSet> {
    let mut builder = FastaBuilder::default();
    for (idx, line) in content.lines().enumerate() {
        builder.push_line(line, idx + 1)?;
    }
    builder.finish()
}

/// Writes a sequence set as FASTA.
///
/// With `line_width`, sequence data is wrapped every `line_width` symbols.
pub fn write_fasta(set: &SequenceSet, line_width: Option<usize>) -> String {
    let mut out = String::new();
    for seq in &set.sequences {
        let _ = writeln!(out, ">{}", seq.id);
        match line_width {
            Some(width) if width > 0 => {
                let chars: Vec<char> = seq.as_str().chars().collect();
                for chunk in chars.chunks(width) {
                    let _ = writeln!(out, "{}", chunk.iter().collect::<String>());
                }
            }
            _ => {
                let _ = writeln!(out, "{}", seq.as_str());
            }
        }
    }
    out
}
