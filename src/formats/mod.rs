//! Sequence file readers and writers.
//!
//! These play the file-format role of a phylogenetics or bioinformatics
//! library: the converter itself never touches files.
//!
//! Reading supports automatic format detection for:
//! - FASTA (.fasta, .fa, .fna, .faa, .fas)
//! - PHYLIP (.phy, .phylip) - sequential and interleaved
//! - NEXUS (.nex, .nexus, .nxs) - first DATA or CHARACTERS block
//!
//! Writing supports FASTA, PHYLIP (relaxed and strict) and NEXUS.
//!
//! Format detection priority:
//! 1. Explicit format specification
//! 2. File extension
//! 3. Content-based detection

pub mod fasta;
pub mod nexus;
pub mod phylip;

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::model::SequenceSet;

/// Detected file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Fasta,
    Phylip,
    Nexus,
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Fasta => write!(f, "FASTA"),
            FileFormat::Phylip => write!(f, "PHYLIP"),
            FileFormat::Nexus => write!(f, "NEXUS"),
        }
    }
}

/// Errors that can occur during file parsing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to open file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty file")]
    EmptyFile,

    #[error("Could not determine file format.\n\
             Hint: Use -f/--format to specify the format explicitly:\n  \
             charm -f fasta <file>   # FASTA format\n  \
             charm -f phylip <file>  # PHYLIP format\n  \
             charm -f nexus <file>   # NEXUS format")]
    UnknownFormat,

    #[error("FASTA error: {0}")]
    FastaError(#[from] fasta::FastaError),

    #[error("PHYLIP error: {0}")]
    PhylipError(#[from] phylip::PhylipError),

    #[error("NEXUS error: {0}")]
    NexusError(#[from] nexus::NexusError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Detects format from file extension.
pub fn detect_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FileFormat> {
    let ext = path.as_ref().extension().and_then(OsStr::to_str)?;
    match ext.to_lowercase().as_str() {
        "fa" | "fas" | "fasta" | "fna" | "faa" | "ffn" | "frn" => Some(FileFormat::Fasta),
        "phy" | "phylip" | "ph" => Some(FileFormat::Phylip),
        "nex" | "nexus" | "nxs" => Some(FileFormat::Nexus),
        _ => None,
    }
}

/// Detects the file format by examining the content.
pub fn detect_format_from_content(content: &str) -> Option<FileFormat> {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.to_uppercase().starts_with("#NEXUS") {
            return Some(FileFormat::Nexus);
        }

        if trimmed.starts_with('>') {
            return Some(FileFormat::Fasta);
        }

        // PHYLIP: first line is "ntax nchar" (two integers)
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() >= 2
            && parts[0].parse::<usize>().is_ok()
            && parts[1].parse::<usize>().is_ok()
        {
            return Some(FileFormat::Phylip);
        }

        return None;
    }

    None
}

/// Parses content with a specific format.
pub fn parse_str(content: &str, format: FileFormat) -> ParseResult<SequenceSet> {
    match format {
        FileFormat::Fasta => fasta::parse_fasta_str(content).map_err(ParseError::FastaError),
        FileFormat::Phylip => phylip::parse_phylip_str(content).map_err(ParseError::PhylipError),
        FileFormat::Nexus => nexus::parse_nexus_str(content).map_err(ParseError::NexusError),
    }
}

/// Parses a sequence file with optional format specification.
///
/// Detection priority:
/// 1. Explicit format (if provided)
/// 2. File extension
/// 3. Content-based detection
pub fn parse_file_with_options<P: AsRef<Path>>(
    path: P,
    forced_format: Option<FileFormat>,
) -> ParseResult<SequenceSet> {
    let file = File::open(&path)?;
    let file_size = file.metadata()?.len() as usize;

    if file_size == 0 {
        return Err(ParseError::EmptyFile);
    }

    let mut reader = BufReader::new(file);
    let mut content = String::with_capacity(file_size);
    reader.read_to_string(&mut content)?;

    if let Some(format) = forced_format {
        return parse_str(&content, format);
    }

    if let Some(format) = detect_format_from_extension(&path) {
        match parse_str(&content, format) {
            Ok(set) => return Ok(set),
            Err(e) => debug!("Extension suggested {} but parsing failed: {}", format, e),
        }
    }

    match detect_format_from_content(&content) {
        Some(format) => parse_str(&content, format),
        None => Err(ParseError::UnknownFormat),
    }
}

/// Parses a sequence file, automatically detecting the format.
pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<SequenceSet> {
    parse_file_with_options(path, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_fasta() {
        let content = ">seq1\nACGT\n";
        assert_eq!(detect_format_from_content(content), Some(FileFormat::Fasta));
    }

    #[test]
    fn test_detect_phylip() {
        let content = "  3   10\nseq1      ACGTACGTAC\n";
        assert_eq!(detect_format_from_content(content), Some(FileFormat::Phylip));
    }

    #[test]
    fn test_detect_nexus() {
        let content = "#nexus\nbegin data;\n";
        assert_eq!(detect_format_from_content(content), Some(FileFormat::Nexus));
    }

    #[test]
    fn test_detect_unknown() {
        let content = "This is not a valid sequence file\n";
        assert_eq!(detect_format_from_content(content), None);
    }

    #[test]
    fn test_detect_with_leading_empty_lines() {
        let content = "\n\n  \n>seq1\nACGT\n";
        assert_eq!(detect_format_from_content(content), Some(FileFormat::Fasta));
    }

    #[test]
    fn test_detect_from_extension() {
        assert_eq!(detect_format_from_extension("test.fa"), Some(FileFormat::Fasta));
        assert_eq!(detect_format_from_extension("test.fasta"), Some(FileFormat::Fasta));
        assert_eq!(detect_format_from_extension("test.PHY"), Some(FileFormat::Phylip));
        assert_eq!(detect_format_from_extension("test.phylip"), Some(FileFormat::Phylip));
        assert_eq!(detect_format_from_extension("test.nex"), Some(FileFormat::Nexus));
        assert_eq!(detect_format_from_extension("test.NXS"), Some(FileFormat::Nexus));
        assert_eq!(detect_format_from_extension("test.txt"), None);
    }

    #[test]
    fn test_parse_file_detects_content() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "3 5\nt1  TCCAA\nt2  TGCAA\nt3  TG-AA\n").unwrap();
        let set = parse_file(file.path()).unwrap();
        assert_eq!(set.sequence_count(), 3);
        assert_eq!(set.get(2).unwrap().as_str(), "TG-AA");
    }

    #[test]
    fn test_parse_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(parse_file(file.path()), Err(ParseError::EmptyFile)));
    }

    #[test]
    fn test_parse_file_forced_format() {
        let mut file = tempfile::Builder::new().suffix(".phy").tempfile().unwrap();
        write!(file, ">t1\nAC\n>t2\nGT\n").unwrap();
        let set = parse_file_with_options(file.path(), Some(FileFormat::Fasta)).unwrap();
        assert_eq!(set.get(1).unwrap().id, "t2");
    }

    #[test]
    fn test_parse_nexus_file() {
        let mut file = tempfile::Builder::new().suffix(".nex").tempfile().unwrap();
        write!(
            file,
            "#NEXUS\nBEGIN DATA;\n  DIMENSIONS NTAX=2 NCHAR=5;\n  MATRIX\n    t1 TCCAA\n    t3 TG-AA\n  ;\nEND;\n"
        )
        .unwrap();
        let set = parse_file(file.path()).unwrap();
        assert_eq!(set.sequence_count(), 2);
        assert_eq!(set.get(1).unwrap().as_str(), "TG-AA");
    }
}
