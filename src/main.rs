#![warn(missing_debug_implementations, rust_2018_idioms, missing_docs)]

//! Finds insertion breakpoints in a reference from the de Bruijn graph of reads.
mod cli;

use log::info;
use rustygap::input::read_path;
use rustygap::insertion::{BackupObserver, CleanInsertion, FuzzyInsertion, HeteroInsertion};
use rustygap::kmer::KmerModel;
use rustygap::observer::shared;
use rustygap::{BreakpointFinder, BreakpointWriter, Error, KmerGraph, Mode, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use structopt::StructOpt;

fn main() -> Result<()> {
    let opt = cli::RustyGap::from_args();
    opt.set_logging();

    rayon::ThreadPoolBuilder::new()
        .num_threads(opt.threads)
        .build_global()
        .or_else(|_| Err(Error::ThreadError))?;

    let config = opt.finder_config();
    config.validate()?;

    let reference = read_path(&opt.reference)?;
    info!(
        "Loaded {} reference records from {}",
        reference.len(),
        opt.reference.display()
    );

    let mut reads = Vec::new();
    for path in &opt.reads {
        let records = read_path(path)?;
        info!("Loaded {} reads from {}", records.len(), path.display());
        reads.extend(records.into_iter().map(|(_, seq)| seq));
    }

    let model = KmerModel::new(config.kmer_size)?;
    let graph = KmerGraph::from_reads(&reads, model, opt.abundance_min);
    drop(reads);

    let out: Box<dyn Write> = match opt.output {
        Some(ref path) => Box::new(BufWriter::new(
            File::create(path).map_err(Error::OutputError)?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };
    let writer = shared(BreakpointWriter::new(out));
    let backup = shared(BackupObserver::new());

    let sequences = reference
        .iter()
        .map(|(_, seq)| seq.as_slice())
        .collect::<Vec<_>>();
    let mut finder = BreakpointFinder::new(config, &graph, &sequences, backup.clone())?;
    finder.add_gap_observer(shared(CleanInsertion::new(writer.clone())));
    finder.add_gap_observer(shared(FuzzyInsertion::new(writer.clone(), config.max_repeat)));
    if config.mode == Mode::Heterozygous {
        finder.add_kmer_observer(shared(HeteroInsertion::new(writer.clone(), config.max_repeat)));
    }

    let stats = finder.run(
        reference
            .iter()
            .map(|(name, seq)| (name.as_str(), seq.as_slice())),
    )?;
    writer.borrow_mut().flush()?;

    let calls = *writer.borrow().stats();
    info!(
        "Scanned {} records, {} k-mers ({} solid, {} ambiguous)",
        stats.records, stats.kmers, stats.solid_kmers, stats.invalid_kmers
    );
    info!(
        "{} gaps closed, {} left unclassified",
        stats.gaps_closed,
        backup.borrow().gaps().len()
    );
    info!(
        "{} breakpoints: {} HOM-clean, {} HOM-fuzzy, {} HET-clean, {} HET-fuzzy",
        calls.total(),
        calls.homozygous_clean,
        calls.homozygous_fuzzy,
        calls.heterozygous_clean,
        calls.heterozygous_fuzzy
    );

    Ok(())
}
