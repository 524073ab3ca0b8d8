use thiserror::Error;

#[derive(Debug, Error)]
/// Errors of which majority are related to I/O issues, incorrect file formats or invalid settings
pub enum Error {
    #[error("Could not read FASTA record")]
    /// Could not read an entry in a fasta file
    FastaRecordError(#[from] std::io::Error),
    #[error("Could not convert bytes in FASTA as it is invalid UTF-8")]
    /// Data is not in UTF-8 format
    NotUTF8(#[from] std::string::FromUtf8Error),
    #[error("Could not create read FASTA file")]
    /// Read FASTA error
    FastaError(#[from] niffler::Error),
    #[error("Could not write breakpoints")]
    /// Breakpoint output could not be created or written
    OutputError(#[source] std::io::Error),
    #[error("Could not read sequencing reads: {0}")]
    /// A read record could not be parsed
    ReadsRecordError(String),
    #[error("Could not spawn threads")]
    /// Create thread pools erorr
    ThreadError,
    #[error(
        "k-mer size {0} is not supported, it must be between {} and {}",
        crate::kmer::MIN_KMER_SIZE,
        crate::kmer::MAX_KMER_SIZE
    )]
    /// k-mer size does not fit the 2-bit encoding
    UnsupportedKmerSize(usize),
    #[error("Max repeat {max_repeat} must be at most k-mer size {kmer_size} minus 2")]
    /// Repeat at a breakpoint would leave no k-mer in the gap or in the look-back window
    MaxRepeatTooLarge {
        /// k-mer size
        kmer_size: usize,
        /// Maximum repeat size at a breakpoint
        max_repeat: usize,
    },
    #[error("At least 2 bits per element are needed for the repeat filter but got {0}")]
    /// Too few bits to derive a hash function
    InvalidBitsPerElement(usize),
    #[error("Graph was built with k-mer size {graph} but the finder uses {engine}")]
    /// Oracle and finder disagree on k
    KmerSizeMismatch {
        /// k-mer size of the graph
        graph: usize,
        /// k-mer size of the finder
        engine: usize,
    },
    #[error("Breakpoint file holds an odd number of sequences ({0})")]
    /// Breakpoints are written in pairs
    OddBreakpointFile(usize),
    #[error("Could not parse breakpoint header `{0}`")]
    /// Header does not follow the breakpoint naming
    MalformedBreakpointHeader(String),
}
