use rustygap::{FinderConfig, Mode};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(about = "Finds insertion breakpoints in a reference from the de Bruijn graph of reads")]
pub(crate) struct RustyGap {
    #[structopt(
        short,
        long,
        help = "Reference FASTA the breakpoints are placed on",
        parse(from_os_str)
    )]
    pub reference: PathBuf,
    #[structopt(
        short = "i",
        long,
        help = "Reads (FASTA or FASTQ, optionally gzipped)",
        required = true,
        parse(from_os_str)
    )]
    pub reads: Vec<PathBuf>,
    #[structopt(short, long, help = "k-mer size", default_value = "31")]
    pub kmer_size: usize,
    #[structopt(
        short = "a",
        long,
        help = "Minimum abundance of a read k-mer to be solid",
        default_value = "3"
    )]
    pub abundance_min: u32,
    #[structopt(long, help = "Largest repeat allowed at a fuzzy breakpoint", default_value = "5")]
    pub max_repeat: usize,
    #[structopt(
        long,
        help = "Reference (k-1)-mers seen more than this many times are repeats",
        default_value = "1"
    )]
    pub repeat_threshold: u32,
    #[structopt(long, help = "Bits per element of the repeat bloom filter", default_value = "12")]
    pub bits_per_element: usize,
    #[structopt(long, help = "Only look for homozygous insertions")]
    pub homozygous_only: bool,
    #[structopt(
        short,
        long,
        help = "Breakpoint output, standard output when missing",
        parse(from_os_str)
    )]
    pub output: Option<PathBuf>,
    #[structopt(short, long, help = "Number of threads", default_value = "1")]
    pub threads: usize,
    #[structopt(
        short,
        long,
        help = "Verbosity (-v info, -vv debug, -vvv trace)",
        parse(from_occurrences)
    )]
    pub verbosity: u8,
}

impl RustyGap {
    pub fn set_logging(&self) {
        use log::LevelFilter::*;

        let mut builder = env_logger::Builder::from_default_env();
        let level = match self.verbosity {
            0 if std::env::var_os("RUST_LOG").is_some() => None,
            0 => Some(Warn),
            1 => Some(Info),
            2 => Some(Debug),
            _ => Some(Trace),
        };
        if let Some(level) = level {
            builder.filter_level(level);
        }
        builder.format_module_path(false).init();
    }

    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig {
            kmer_size: self.kmer_size,
            max_repeat: self.max_repeat,
            mode: if self.homozygous_only {
                Mode::Homozygous
            } else {
                Mode::Heterozygous
            },
            repeat_threshold: self.repeat_threshold,
            bits_per_element: self.bits_per_element,
        }
    }
}
