//! Abundance filtered k-mer counting shared by graph and repeat filter construction.
use crate::kmer::KmerModel;
use log::debug;
use rayon::prelude::*;
use std::collections::HashMap;

/// Distinct canonical k-mers that reached a minimum abundance, sorted by value.
#[derive(Debug, Clone, Default)]
pub struct KmerCounts {
    kmers: Vec<u64>,
}

impl KmerCounts {
    /// Number of distinct qualifying k-mers
    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    /// No k-mer reached the abundance
    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    /// Kept k-mers in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.kmers.iter().copied()
    }
}

/// Counts the valid canonical k-mers of `sequences` and keeps those seen at least
/// `min_abundance` times
pub fn count_kmers<S>(sequences: &[S], model: &KmerModel, min_abundance: u32) -> KmerCounts
where
    S: AsRef<[u8]> + Sync,
{
    let counts = sequences
        .par_iter()
        .fold(HashMap::<u64, u32>::new, |mut counts, seq| {
            model
                .kmers(seq.as_ref())
                .filter(|kmer| kmer.valid)
                .for_each(|kmer| *counts.entry(kmer.canonical).or_default() += 1);
            counts
        })
        .reduce(HashMap::new, |left, right| {
            let (mut larger, smaller) = if left.len() >= right.len() {
                (left, right)
            } else {
                (right, left)
            };
            for (kmer, count) in smaller {
                *larger.entry(kmer).or_default() += count;
            }
            larger
        });

    debug!(
        "Counted {} distinct {}-mers in {} sequences",
        counts.len(),
        model.size(),
        sequences.len()
    );

    let mut kmers = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_abundance)
        .map(|(kmer, _)| kmer)
        .collect::<Vec<u64>>();
    kmers.par_sort_unstable();

    KmerCounts { kmers }
}
