//! NEXUS reader and writer.
//!
//! Reading takes the first DATA or CHARACTERS block of a file and ignores
//! every other block (TAXA, TREES, ...). Commands are case insensitive,
//! bracketed comments are dropped and taxon names may be quoted. The MATRIX
//! may be sequential or INTERLEAVE, and MATCHCHAR is resolved against the
//! first taxon.
//!
//! Writing emits a single DATA block, the layout most phylogenetics
//! programs read:
//! ```text
//! #NEXUS
//!
//! BEGIN DATA;
//!     DIMENSIONS NTAX=3 NCHAR=5;
//!     FORMAT DATATYPE=DNA GAP=- MISSING=?;
//!     MATRIX
//!         t1  TCCAA
//!         t2  TGCAA
//!         t3  TG-AA
//!     ;
//! END;
//! ```

use std::collections::HashMap;
use std::fmt::Write as _;

use thiserror::Error;

use crate::model::{Sequence, SequenceSet};

/// Errors that can occur during NEXUS parsing.
#[derive(Error, Debug)]
pub enum NexusError {
    #[error("Not a NEXUS file (must start with #NEXUS)")]
    NotNexus,

    #[error("Empty NEXUS file")]
    EmptyFile,

    #[error("No DATA or CHARACTERS block found")]
    NoDataBlock,

    #[error("Missing MATRIX command in {block} block")]
    MissingMatrix { block: String },

    #[error("Invalid DIMENSIONS: {key}={value}")]
    InvalidDimensions { key: &'static str, value: String },

    #[error("Expected {expected} sequences (NTAX), found {found}")]
    SequenceCountMismatch { expected: usize, found: usize },

    #[error("Sequence '{name}' has length {found}, expected {expected} (NCHAR)")]
    SequenceLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Unterminated MATRIX (missing ';')")]
    UnterminatedMatrix,

    #[error("Duplicate sequence name: '{0}'")]
    DuplicateName(String),
}

/// Result type for NEXUS operations.
pub type NexusResult<T> = Result<T, NexusError>;

/// A NEXUS command split into words, terminated by `;` unless it is the
/// trailing text of the file.
struct Command {
    words: Vec<String>,
    terminated: bool,
}

impl Command {
    fn keyword(&self) -> String {
        self.words
            .first()
            .map(|w| w.to_uppercase())
            .unwrap_or_default()
    }

    /// Looks up `KEY=value`, tolerating spaces around `=`.
    fn value(&self, key: &str) -> Option<String> {
        let joined = self.words.join(" ").replace(" =", "=").replace("= ", "=");
        joined.split_whitespace().find_map(|word| {
            let (name, value) = word.split_once('=')?;
            (name.eq_ignore_ascii_case(key) && !value.is_empty()).then(|| value.to_string())
        })
    }

    fn has_flag(&self, flag: &str) -> bool {
        self.words.iter().any(|w| w.eq_ignore_ascii_case(flag))
    }
}

/// Parses the first DATA or CHARACTERS block of NEXUS content.
pub fn parse_nexus_str(content: &str) -> NexusResult<SequenceSet> {
    let mut lines = content.lines().skip_while(|line| line.trim().is_empty());
    let header = lines.next().ok_or(NexusError::EmptyFile)?;
    if !header.trim().to_uppercase().starts_with("#NEXUS") {
        return Err(NexusError::NotNexus);
    }
    let body: Vec<&str> = lines.collect();
    let commands = split_commands(&body.join("\n"));

    let mut block: Option<String> = None;
    let mut ntax: Option<usize> = None;
    let mut nchar: Option<usize> = None;
    let mut interleave = false;
    let mut matchchar: Option<char> = None;
    let mut matrix: Option<&[String]> = None;

    for command in &commands {
        match command.keyword().as_str() {
            "BEGIN" => {
                let name = command.words.get(1).map(|w| w.to_uppercase());
                if let Some(name @ ("DATA" | "CHARACTERS")) = name.as_deref() {
                    block = Some(name.to_string());
                }
            }
            "END" | "ENDBLOCK" if block.is_some() => break,
            _ if block.is_none() => {}
            "DIMENSIONS" => {
                ntax = dimension(command, "NTAX")?.or(ntax);
                nchar = dimension(command, "NCHAR")?.or(nchar);
            }
            "FORMAT" => {
                interleave = command.has_flag("INTERLEAVE")
                    || command
                        .value("INTERLEAVE")
                        .is_some_and(|v| !v.eq_ignore_ascii_case("no"));
                matchchar = command.value("MATCHCHAR").and_then(|v| v.chars().next());
            }
            "MATRIX" => {
                if !command.terminated {
                    return Err(NexusError::UnterminatedMatrix);
                }
                matrix = Some(&command.words[1..]);
            }
            _ => {}
        }
    }

    let block = block.ok_or(NexusError::NoDataBlock)?;
    let tokens = matrix.ok_or(NexusError::MissingMatrix { block })?;

    let mut sequences = if interleave {
        read_interleaved(tokens, ntax, nchar)?
    } else {
        read_sequential(tokens, ntax, nchar)?
    };
    if let Some(mc) = matchchar {
        resolve_matchchar(&mut sequences, mc);
    }

    if let Some(expected) = ntax {
        if sequences.len() != expected {
            return Err(NexusError::SequenceCountMismatch {
                expected,
                found: sequences.len(),
            });
        }
    }
    if let Some(expected) = nchar {
        if let Some((name, data)) = sequences
            .iter()
            .find(|(_, data)| data.chars().count() != expected)
        {
            return Err(NexusError::SequenceLengthMismatch {
                name: name.clone(),
                expected,
                found: data.chars().count(),
            });
        }
    }

    Ok(sequences
        .into_iter()
        .map(|(name, data)| Sequence::new(name, data))
        .collect())
}

fn dimension(command: &Command, key: &'static str) -> NexusResult<Option<usize>> {
    command
        .value(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| NexusError::InvalidDimensions { key, value })
        })
        .transpose()
}

/// Splits NEXUS text into commands.
///
/// Bracketed comments are dropped. Quoted words stay whole, quotes
/// included, and may contain whitespace, `;` or `[`.
fn split_commands(content: &str) -> Vec<Command> {
    let mut commands = Vec::new();
    let mut words: Vec<String> = Vec::new();
    let mut word = String::new();
    let mut comment_depth = 0usize;
    let mut quote: Option<char> = None;

    for c in content.chars() {
        if comment_depth > 0 {
            match c {
                '[' => comment_depth += 1,
                ']' => comment_depth -= 1,
                _ => {}
            }
            continue;
        }
        if let Some(q) = quote {
            word.push(c);
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '[' => {
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
                comment_depth = 1;
            }
            '\'' | '"' => {
                word.push(c);
                quote = Some(c);
            }
            ';' => {
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
                commands.push(Command {
                    words: std::mem::take(&mut words),
                    terminated: true,
                });
            }
            c if c.is_whitespace() => {
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            }
            c => word.push(c),
        }
    }

    if !word.is_empty() {
        words.push(word);
    }
    if !words.is_empty() {
        commands.push(Command {
            words,
            terminated: false,
        });
    }
    commands
}

/// Strips surrounding quotes; `''` inside single quotes is one `'`.
fn unquote(word: &str) -> String {
    let quoted = |q: char| word.len() >= 2 && word.starts_with(q) && word.ends_with(q);
    if quoted('\'') {
        word[1..word.len() - 1].replace("''", "'")
    } else if quoted('"') {
        word[1..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Without NCHAR, a word mixing letters and digits, holding an underscore
/// or quoted starts the next taxon.
fn looks_like_name(word: &str) -> bool {
    if word.starts_with('\'') || word.starts_with('"') || word.contains('_') {
        return true;
    }
    let has_letters = word.chars().any(|c| c.is_ascii_alphabetic());
    let has_digits = word.chars().any(|c| c.is_ascii_digit());
    has_letters && has_digits
}

/// Sequential matrix: each name is followed by its data, possibly spread
/// over several words.
fn read_sequential(
    tokens: &[String],
    ntax: Option<usize>,
    nchar: Option<usize>,
) -> NexusResult<Vec<(String, String)>> {
    let mut sequences: Vec<(String, String)> = Vec::new();
    let mut tokens = tokens.iter().peekable();

    while let Some(token) = tokens.next() {
        if ntax.is_some_and(|n| sequences.len() >= n) {
            break;
        }
        let name = unquote(token);
        if sequences.iter().any(|(n, _)| n == &name) {
            return Err(NexusError::DuplicateName(name));
        }

        let mut data = String::new();
        let mut length = 0;
        while let Some(next) = tokens.peek() {
            let done = match nchar {
                Some(n) => length >= n,
                None => length > 0 && looks_like_name(next),
            };
            if done {
                break;
            }
            data.push_str(next);
            length += next.chars().count();
            tokens.next();
        }
        sequences.push((name, data));
    }

    Ok(sequences)
}

/// Interleaved matrix: every block repeats the names in order.
fn read_interleaved(
    tokens: &[String],
    ntax: Option<usize>,
    nchar: Option<usize>,
) -> NexusResult<Vec<(String, String)>> {
    let mut sequences: Vec<(String, String)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut first_block = true;
    let mut tokens = tokens.iter();
    let complete = |sequences: &[(String, String)]| {
        nchar.is_some_and(|n| {
            ntax.map_or(true, |t| sequences.len() == t)
                && sequences.iter().all(|(_, d)| d.chars().count() >= n)
        })
    };

    while let Some(token) = tokens.next() {
        if !sequences.is_empty() && complete(sequences.as_slice()) {
            break;
        }

        let name = unquote(token);
        let data = tokens.next().map(String::as_str).unwrap_or_default();
        match index.get(&name) {
            Some(&idx) => {
                first_block = false;
                sequences[idx].1.push_str(data);
            }
            None if first_block && ntax.map_or(true, |t| sequences.len() < t) => {
                index.insert(name.clone(), sequences.len());
                sequences.push((name, data.to_string()));
            }
            // A name first seen after the opening block is one taxon too many
            None => {
                return Err(NexusError::SequenceCountMismatch {
                    expected: ntax.unwrap_or(sequences.len()),
                    found: sequences.len() + 1,
                })
            }
        }
    }

    Ok(sequences)
}

/// Replaces MATCHCHAR positions with the first taxon's state.
fn resolve_matchchar(sequences: &mut [(String, String)], matchchar: char) {
    let Some(((_, reference), rest)) = sequences.split_first_mut() else {
        return;
    };
    let reference: Vec<char> = reference.chars().collect();
    for (_, data) in rest {
        *data = data
            .chars()
            .enumerate()
            .map(|(i, c)| match reference.get(i) {
                Some(&r) if c == matchchar => r,
                _ => c,
            })
            .collect();
    }
}

/// The FORMAT command of a DATA block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NexusFormat {
    /// DATATYPE value (DNA, RNA, PROTEIN, STANDARD)
    pub datatype: String,
    pub gap: char,
    pub missing: char,
    /// Explicit SYMBOLS list, needed for STANDARD data
    pub symbols: Option<String>,
}

impl NexusFormat {
    pub fn new(datatype: impl Into<String>) -> Self {
        Self {
            datatype: datatype.into(),
            gap: '-',
            missing: '?',
            symbols: None,
        }
    }

    pub fn with_symbols(mut self, symbols: impl Into<String>) -> Self {
        self.symbols = Some(symbols.into());
        self
    }
}

/// Quotes a taxon name when it contains NEXUS punctuation or whitespace.
fn quote_name(name: &str) -> String {
    let needs_quotes = name.is_empty()
        || name
            .chars()
            .any(|c| c.is_whitespace() || "()[]{}/\\,;:=*'\"`+-<>".contains(c));
    if needs_quotes {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

/// Writes a sequence set as a NEXUS DATA block.
pub fn write_nexus(set: &SequenceSet, format: &NexusFormat) -> String {
    let (_, nchar) = set.length_range();
    let names: Vec<String> = set.sequences.iter().map(|s| quote_name(&s.id)).collect();
    let width = names.iter().map(String::len).max().unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "#NEXUS\n");
    let _ = writeln!(out, "BEGIN DATA;");
    let _ = writeln!(
        out,
        "    DIMENSIONS NTAX={} NCHAR={};",
        set.sequence_count(),
        nchar
    );
    let _ = write!(
        out,
        "    FORMAT DATATYPE={} GAP={} MISSING={}",
        format.datatype, format.gap, format.missing
    );
    if let Some(symbols) = &format.symbols {
        let _ = write!(out, " SYMBOLS=\"{}\"", symbols);
    }
    let _ = writeln!(out, ";");
    let _ = writeln!(out, "    MATRIX");
    for (name, seq) in names.iter().zip(&set.sequences) {
        let _ = writeln!(out, "        {:<width$}  {}", name, seq.as_str(), width = width);
    }
    let _ = writeln!(out, "    ;");
    let _ = writeln!(out, "END;");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_dna_block() {
        let set = SequenceSet::new(vec![
            Sequence::new("t1", "TCCAA"),
            Sequence::new("t3", "TG-AA"),
        ]);
        let text = write_nexus(&set, &NexusFormat::new("DNA"));
        assert_eq!(
            text,
            "#NEXUS\n\nBEGIN DATA;\n    DIMENSIONS NTAX=2 NCHAR=5;\n    \
             FORMAT DATATYPE=DNA GAP=- MISSING=?;\n    MATRIX\n        \
             t1  TCCAA\n        t3  TG-AA\n    ;\nEND;\n"
        );
    }

    #[test]
    fn test_symbols_for_standard_data() {
        let set = SequenceSet::new(vec![Sequence::new("t1", "0101")]);
        let text = write_nexus(&set, &NexusFormat::new("STANDARD").with_symbols("0 1"));
        assert!(text.contains("FORMAT DATATYPE=STANDARD GAP=- MISSING=? SYMBOLS=\"0 1\";"));
    }

    #[test]
    fn test_names_are_quoted() {
        assert_eq!(quote_name("Homo sapiens"), "'Homo sapiens'");
        assert_eq!(quote_name("O'Brien"), "'O''Brien'");
        assert_eq!(quote_name("t1"), "t1");
    }

    #[test]
    fn test_parse_simple_nexus() {
        let content = r#"#NEXUS
BEGIN DATA;
  DIMENSIONS NTAX=3 NCHAR=10;
  FORMAT DATATYPE=DNA GAP=- MISSING=?;
  MATRIX
    seq1 ACGTACGTAC
    seq2 TGCATGCATG
    seq3 AAAACCCC-?
  ;
END;
"#;
        let set = parse_nexus_str(content).unwrap();
        assert_eq!(set.sequence_count(), 3);
        assert_eq!(set.get(0).unwrap().id, "seq1");
        assert_eq!(set.get(2).unwrap().as_str(), "AAAACCCC-?");
    }

    #[test]
    fn test_parse_interleaved_nexus() {
        let content = r#"#NEXUS
BEGIN DATA;
  DIMENSIONS NTAX=2 NCHAR=20;
  FORMAT DATATYPE=DNA INTERLEAVE;
  MATRIX
    seq1 ACGTACGTAC
    seq2 TGCATGCATG

    seq1 GGGGGGGGGG
    seq2 CCCCCCCCCC
  ;
END;
"#;
        let set = parse_nexus_str(content).unwrap();
        assert_eq!(set.get(0).unwrap().as_str(), "ACGTACGTACGGGGGGGGGG");
        assert_eq!(set.get(1).unwrap().as_str(), "TGCATGCATGCCCCCCCCCC");
    }

    #[test]
    fn test_parse_quoted_names() {
        let content = "#NEXUS\nBEGIN DATA;\n  DIMENSIONS NTAX=2 NCHAR=4;\n  MATRIX\n    \
                       'Homo sapiens' ACGT\n    'O''Brien' TG-A\n  ;\nEND;\n";
        let set = parse_nexus_str(content).unwrap();
        assert_eq!(set.get(0).unwrap().id, "Homo sapiens");
        assert_eq!(set.get(1).unwrap().id, "O'Brien");
    }

    #[test]
    fn test_characters_block_without_ntax() {
        let content = r#"#NEXUS
BEGIN TAXA;
  DIMENSIONS NTAX=2;
  TAXLABELS seq1 seq2;
END;
BEGIN CHARACTERS;
  DIMENSIONS NCHAR=10;
  FORMAT DATATYPE=PROTEIN;
  MATRIX
    seq1 ACDEFGHIKL
    seq2 MNPQRSTVWY
  ;
END;
"#;
        let set = parse_nexus_str(content).unwrap();
        assert_eq!(set.sequence_count(), 2);
        assert_eq!(set.get(1).unwrap().as_str(), "MNPQRSTVWY");
    }

    #[test]
    fn test_case_insensitive_with_comments() {
        let content = r#"#nexus
[written by hand]
begin data;
  dimensions ntax = 2 nchar = 5;
  format datatype=dna
    gap=- ;
  matrix
    [1] seq_1 ACG
    TA
    [2] seq_2 TGCAT
  ;
end;
"#;
        let set = parse_nexus_str(content).unwrap();
        assert_eq!(set.get(0).unwrap().id, "seq_1");
        assert_eq!(set.get(0).unwrap().as_str(), "ACGTA");
        assert_eq!(set.get(1).unwrap().as_str(), "TGCAT");
    }

    #[test]
    fn test_matchchar() {
        let content = r#"#NEXUS
BEGIN DATA;
  DIMENSIONS NTAX=3 NCHAR=10;
  FORMAT DATATYPE=DNA GAP=- MATCHCHAR=.;
  MATRIX
    seq1 ACGTACGTAC
    seq2 ....TG....
    seq3 T.T.T.T.T.
  ;
END;
"#;
        let set = parse_nexus_str(content).unwrap();
        assert_eq!(set.get(1).unwrap().as_str(), "ACGTTGGTAC");
        assert_eq!(set.get(2).unwrap().as_str(), "TCTTTCTTTC");
    }

    #[test]
    fn test_written_block_reads_back() {
        let set = SequenceSet::new(vec![
            Sequence::new("Homo sapiens", "01-?1"),
            Sequence::new("O'Brien", "02010"),
            Sequence::new("t3", "02-10"),
        ]);
        let text = write_nexus(&set, &NexusFormat::new("STANDARD").with_symbols("0 1 2"));
        assert_eq!(parse_nexus_str(&text).unwrap(), set);
    }

    #[test]
    fn test_not_nexus() {
        assert!(matches!(
            parse_nexus_str(">seq1\nACGT\n"),
            Err(NexusError::NotNexus)
        ));
        assert!(matches!(parse_nexus_str("\n  \n"), Err(NexusError::EmptyFile)));
    }

    #[test]
    fn test_no_data_block() {
        let content = "#NEXUS\nBEGIN TAXA;\n  DIMENSIONS NTAX=3;\nEND;\n";
        assert!(matches!(parse_nexus_str(content), Err(NexusError::NoDataBlock)));
    }

    #[test]
    fn test_missing_matrix() {
        let content = "#NEXUS\nBEGIN DATA;\n  DIMENSIONS NTAX=1 NCHAR=2;\nEND;\n";
        assert!(matches!(
            parse_nexus_str(content),
            Err(NexusError::MissingMatrix { .. })
        ));
    }

    #[test]
    fn test_unterminated_matrix() {
        let content = "#NEXUS\nBEGIN DATA;\n  DIMENSIONS NTAX=1 NCHAR=2;\n  MATRIX\n    t1 AC\n";
        assert!(matches!(
            parse_nexus_str(content),
            Err(NexusError::UnterminatedMatrix)
        ));
    }

    #[test]
    fn test_dimension_mismatches() {
        let too_few = "#NEXUS\nBEGIN DATA;\nDIMENSIONS NTAX=3 NCHAR=2;\nMATRIX\nt1 AC\nt2 GT\n;\nEND;\n";
        assert!(matches!(
            parse_nexus_str(too_few),
            Err(NexusError::SequenceCountMismatch { expected: 3, found: 2 })
        ));

        let short = "#NEXUS\nBEGIN DATA;\nDIMENSIONS NTAX=2 NCHAR=3;\nMATRIX\nt1 ACG\nt2 GT\n;\nEND;\n";
        assert!(matches!(
            parse_nexus_str(short),
            Err(NexusError::SequenceLengthMismatch { found: 2, .. })
        ));

        let bad = "#NEXUS\nBEGIN DATA;\nDIMENSIONS NTAX=two;\nMATRIX\nt1 AC\n;\nEND;\n";
        assert!(matches!(
            parse_nexus_str(bad),
            Err(NexusError::InvalidDimensions { key: "NTAX", .. })
        ));
    }

    #[test]
    fn test_duplicate_name() {
        let content = "#NEXUS\nBEGIN DATA;\nDIMENSIONS NTAX=2 NCHAR=2;\nMATRIX\nt1 AC\nt1 GT\n;\nEND;\n";
        assert!(matches!(
            parse_nexus_str(content),
            Err(NexusError::DuplicateName(name)) if name == "t1"
        ));
    }
}
