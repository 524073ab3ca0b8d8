#![warn(missing_debug_implementations, rust_2018_idioms, missing_docs)]

//! Streaming detection of insertion breakpoints.
//! The reference is walked k-mer by k-mer against the de Bruijn graph of the reads:
//! reference stretches absent from the reads are gaps, and the solid k-mers on each
//! side of a gap anchor a homozygous insertion. Branching in the graph while the
//! reference stays covered points at heterozygous insertions.
//!
//! Breakpoints are written as pairs of FASTA entries holding the left and right anchors.

pub mod bloom;
pub mod breakpoint;
pub mod counter;
pub mod error;
pub mod finder;
pub mod graph;
pub mod history;
pub mod input;
pub mod insertion;
pub mod kmer;
pub mod observer;
pub mod repeat;
pub mod stretch;

/// Nucleotide alphabet used, indexed by 2-bit code
pub const NUCLEOTIDES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Default k-mer size
pub const DEFAULT_KMER_SIZE: usize = 31;
/// Default largest repeat at a fuzzy breakpoint
pub const DEFAULT_MAX_REPEAT: usize = 5;
/// Default number of reference occurrences above which a `(k-1)`-mer is a repeat
pub const DEFAULT_REPEAT_THRESHOLD: u32 = 1;
/// Default bloom filter budget
pub const DEFAULT_BITS_PER_ELEMENT: usize = 12;
/// Default minimum abundance of a solid read k-mer
pub const DEFAULT_ABUNDANCE_MIN: u32 = 3;

/// Result with the crate error
pub type Result<T> = std::result::Result<T, crate::error::Error>;

pub use crate::breakpoint::{read_breakpoints, BreakpointEvent, BreakpointWriter, Classification};
pub use crate::error::Error;
pub use crate::finder::{BreakpointFinder, FinderConfig, Mode, ScanStats};
pub use crate::graph::{GraphOracle, KmerGraph};
