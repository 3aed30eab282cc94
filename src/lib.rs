//! # charm - character matrices in and out of tables
//!
//! Moves alignment data between a column-oriented [`Table`], phylogenetic
//! [`CharacterMatrix`] objects, [`MultipleSeqAlignment`] records and plain
//! `{identifier: sequence}` mappings.
//!
//! ## Architecture
//!
//! - `table`: the shared intermediate (plain or categorical columns)
//! - `convert`: the from/to conversions, all routed through `Table`
//! - `charmatrix`: character matrices tagged with a [`DataType`]
//! - `bioalign`: sequence records tagged with an [`Alphabet`]
//! - `formats`: FASTA, PHYLIP and NEXUS text for the above
//! - `model`: raw sequence records shared by the formats
//!
//! ```
//! use charm::{from_sequence_dict, to_charmatrix, DataType, MatrixFormat};
//!
//! let table = from_sequence_dict([("t1", "TCCAA"), ("t2", "TGCAA"), ("t3", "TG-AA")], true)?;
//! assert_eq!(table.get("t3", 2)?, Some("-"));
//!
//! let matrix = to_charmatrix(&table, DataType::Dna)?;
//! assert_eq!(matrix.as_string(MatrixFormat::Phylip), "3 5\nt1  TCCAA\nt2  TGCAA\nt3  TG-AA\n");
//! # Ok::<(), charm::CharmError>(())
//! ```

pub mod bioalign;
pub mod charmatrix;
pub mod convert;
pub mod error;
pub mod formats;
pub mod model;
pub mod table;

pub use bioalign::{Alphabet, AlignmentFormat, MultipleSeqAlignment, Seq, SeqRecord};
pub use charmatrix::{CharacterMatrix, DataType, MatrixFormat};
pub use convert::{
    from_bioalignment, from_charmatrix, from_sequence_dict, to_bioalignment, to_charmatrix,
    to_sequence_dict,
};
pub use error::{CharmError, Result};
pub use table::{Cell, Column, Table};
