//! charm - convert alignments through a character table
//!
//! Reads a FASTA, PHYLIP or NEXUS alignment, loads it into a table and writes it
//! back out as a table (CSV/JSON), a character matrix or an alignment.
//!
//! ## Usage
//!
//! ```bash
//! charm alignment.fasta --to table-csv
//! charm -f phylip matrix.txt --to nexus --data-type standard -o matrix.nex
//! charm alignment.phy --to alignment-phylip --alphabet generic_dna
//! charm matrix.nex --to table-json --data-type standard
//! ```
//!
//! Log verbosity is read from `CHARM_LOG` (default `warn`).

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use charm::formats::{parse_file_with_options, FileFormat};
use charm::model::SequenceSet;
use charm::{
    from_bioalignment, from_charmatrix, from_sequence_dict, to_bioalignment, to_charmatrix,
    AlignmentFormat, Alphabet, CharacterMatrix, DataType, MatrixFormat, MultipleSeqAlignment,
    Table,
};

/// Input format specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// FASTA format
    Fasta,
    /// PHYLIP format
    Phylip,
    /// NEXUS format (first DATA or CHARACTERS block)
    Nexus,
    /// Auto-detect from extension and content
    Auto,
}

impl From<FormatArg> for Option<FileFormat> {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Fasta => Some(FileFormat::Fasta),
            FormatArg::Phylip => Some(FileFormat::Phylip),
            FormatArg::Nexus => Some(FileFormat::Nexus),
            FormatArg::Auto => None,
        }
    }
}

/// What to write
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputArg {
    /// Table as CSV, one column per sequence
    TableCsv,
    /// Table as JSON, including category sets
    TableJson,
    /// Character matrix as relaxed PHYLIP
    Phylip,
    /// Character matrix as FASTA
    Fasta,
    /// Character matrix as NEXUS
    Nexus,
    /// Alignment as strict PHYLIP
    AlignmentPhylip,
    /// Alignment as FASTA
    AlignmentFasta,
}

/// charm - move alignments between tables, character matrices and records
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Alignment file to read (FASTA, PHYLIP or NEXUS format)
    file: PathBuf,

    /// Force a specific input format (overrides auto-detection)
    #[arg(short = 'f', long = "format", value_enum, default_value = "auto")]
    format: FormatArg,

    /// Output kind
    #[arg(short = 't', long = "to", value_enum, default_value = "table-csv")]
    to: OutputArg,

    /// Character data type for matrix output: dna, rna, protein, standard
    #[arg(short = 'd', long = "data-type", default_value = "dna")]
    data_type: String,

    /// Alphabet for alignment output (e.g. generic_dna, generic_protein)
    #[arg(short = 'a', long = "alphabet", default_value = "generic_alphabet")]
    alphabet: String,

    /// Keep table columns plain instead of categorical
    #[arg(long = "plain")]
    plain: bool,

    /// Extra categories added to every column (comma separated)
    #[arg(long = "extra-values", value_delimiter = ',')]
    extra_values: Vec<String>,

    /// Output file. Use "-" for stdout.
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: String,
}

/// Loads the parsed records into a table, going through the collaborator
/// type that matches the requested output.
fn load_table(
    set: &SequenceSet,
    args: &Args,
    data_type: DataType,
    alphabet: Alphabet,
) -> Result<Table> {
    let categorical = !args.plain;
    let table = match args.to {
        OutputArg::Phylip | OutputArg::Fasta | OutputArg::Nexus => {
            let matrix = CharacterMatrix::from_sequence_set(data_type, set)?;
            from_charmatrix(&matrix, categorical)
        }
        OutputArg::AlignmentPhylip | OutputArg::AlignmentFasta => {
            let alignment = MultipleSeqAlignment::from_sequence_set(alphabet, set)?;
            let table = from_bioalignment(&alignment);
            if categorical {
                table
            } else {
                table.as_object()
            }
        }
        OutputArg::TableCsv | OutputArg::TableJson => {
            from_sequence_dict(set.pairs(), categorical)?
        }
    };

    if args.extra_values.is_empty() || args.plain {
        return Ok(table);
    }
    let extra: Vec<&str> = args.extra_values.iter().map(String::as_str).collect();
    Ok(table.as_categorical(&extra))
}

fn write_output(
    table: &Table,
    args: &Args,
    data_type: DataType,
    alphabet: Alphabet,
    out: &mut dyn Write,
) -> Result<()> {
    match args.to {
        OutputArg::TableCsv => table.to_csv(&mut *out)?,
        OutputArg::TableJson => {
            serde_json::to_writer_pretty(&mut *out, table)?;
            writeln!(out)?;
        }
        OutputArg::Phylip | OutputArg::Fasta | OutputArg::Nexus => {
            let format = match args.to {
                OutputArg::Phylip => MatrixFormat::Phylip,
                OutputArg::Fasta => MatrixFormat::Fasta,
                _ => MatrixFormat::Nexus,
            };
            let matrix = to_charmatrix(table, data_type)?;
            out.write_all(matrix.as_string(format).as_bytes())?;
        }
        OutputArg::AlignmentPhylip | OutputArg::AlignmentFasta => {
            let format = if args.to == OutputArg::AlignmentPhylip {
                AlignmentFormat::Phylip
            } else {
                AlignmentFormat::Fasta
            };
            let alignment = to_bioalignment(table, alphabet)?;
            out.write_all(alignment.format(format).as_bytes())?;
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    // Validate tags before touching the file
    let data_type: DataType = args.data_type.parse()?;
    let alphabet: Alphabet = args.alphabet.parse()?;

    let set = parse_file_with_options(&args.file, args.format.into())
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    if set.common_length().is_none() {
        let (min_len, max_len) = set.length_range();
        warn!(min_len, max_len, "Sequences have different lengths");
        anyhow::bail!(
            "Sequences have different lengths (min: {}, max: {}). Not a valid alignment.",
            min_len,
            max_len
        );
    }

    let table = load_table(&set, &args, data_type, alphabet)?;
    info!(
        columns = table.ncols(),
        rows = table.nrows(),
        "Loaded {}",
        args.file.display()
    );

    if args.output == "-" {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        write_output(&table, &args, data_type, alphabet, &mut handle)?;
    } else {
        let mut file = File::create(&args.output)
            .with_context(|| format!("Failed to create {}", args.output))?;
        write_output(&table, &args, data_type, alphabet, &mut file)?;
        eprintln!("Wrote {} sequences to {}", table.ncols(), args.output);
    }

    Ok(())
}

fn main() -> Result<()> {
    let log_level = std::env::var("CHARM_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    run(Args::parse())
}
