//! Membership and topology queries against the de Bruijn graph of the reads.
use crate::counter::{count_kmers, KmerCounts};
use crate::kmer::{Kmer, KmerModel, Strand};
use log::info;
use std::collections::HashSet;

/// A graph node: a canonical k-mer seen from one strand.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Node {
    /// Canonical value
    pub kmer: u64,
    /// Strand of the k-mer the node was built from
    pub strand: Strand,
}

impl Node {
    /// Value of the node in the orientation it is traversed in
    pub fn oriented(&self, model: &KmerModel) -> u64 {
        match self.strand {
            Strand::Forward => self.kmer,
            Strand::Reverse => model.reverse_complement(self.kmer),
        }
    }
}

impl From<&Kmer> for Node {
    fn from(kmer: &Kmer) -> Self {
        Self {
            kmer: kmer.canonical,
            strand: kmer.strand,
        }
    }
}

/// Read-only membership oracle queried by the breakpoint finder.
/// Absent nodes are a normal answer, never an error.
pub trait GraphOracle {
    /// k-mer size the graph was built with
    fn kmer_size(&self) -> usize;
    /// Whether the node is a solid k-mer
    fn contains(&self, node: &Node) -> bool;
    /// Number of solid predecessors of the node in its orientation
    fn in_degree(&self, node: &Node) -> usize;
    /// Number of solid successors of the node in its orientation
    fn out_degree(&self, node: &Node) -> usize;
}

/// Node-centric de Bruijn graph: the set of solid k-mers, edges are implicit.
#[derive(Debug, Clone)]
pub struct KmerGraph {
    model: KmerModel,
    solid: HashSet<u64>,
}

impl KmerGraph {
    /// Graph of the k-mers occuring at least `abundance_min` times in `reads`
    pub fn from_reads<S>(reads: &[S], model: KmerModel, abundance_min: u32) -> Self
    where
        S: AsRef<[u8]> + Sync,
    {
        let counts = count_kmers(reads, &model, abundance_min);
        info!(
            "Graph holds {} solid {}-mers (abundance >= {})",
            counts.len(),
            model.size(),
            abundance_min
        );
        Self::from_counts(model, &counts)
    }

    /// Graph from already counted solid k-mers
    pub fn from_counts(model: KmerModel, counts: &KmerCounts) -> Self {
        Self {
            model,
            solid: counts.iter().collect(),
        }
    }

    /// Number of solid k-mers
    pub fn len(&self) -> usize {
        self.solid.len()
    }

    /// No read k-mer was solid
    pub fn is_empty(&self) -> bool {
        self.solid.is_empty()
    }

    fn has(&self, value: u64) -> bool {
        self.solid.contains(&self.model.canonical(value))
    }
}

impl GraphOracle for KmerGraph {
    fn kmer_size(&self) -> usize {
        self.model.size()
    }

    fn contains(&self, node: &Node) -> bool {
        self.solid.contains(&node.kmer)
    }

    fn in_degree(&self, node: &Node) -> usize {
        if !self.contains(node) {
            return 0;
        }
        let value = node.oriented(&self.model);
        (0..4)
            .filter(|base| self.has(self.model.push_front(value, *base)))
            .count()
    }

    fn out_degree(&self, node: &Node) -> usize {
        if !self.contains(node) {
            return 0;
        }
        let value = node.oriented(&self.model);
        (0..4)
            .filter(|base| self.has(self.model.push_back(value, *base)))
            .count()
    }
}
