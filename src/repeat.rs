//! Over-represented `(k-1)`-mers of the reference, used to discount anchors inside repeats.
use crate::bloom::BloomFilter;
use crate::counter::count_kmers;
use crate::error::Error;
use crate::kmer::KmerModel;
use crate::Result;
use log::info;

/// Bloom filter of the canonical `(k-1)`-mers seen more than `threshold` times in the reference.
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct ReferenceRepeatFilter {
    model: KmerModel,
    bloom: BloomFilter,
    nb_items: usize,
}

impl ReferenceRepeatFilter {
    /// Counts the `(k-1)`-mers of `reference` and inserts those above `threshold` in a new filter
    pub fn build<S>(
        reference: &[S],
        kmer_model: &KmerModel,
        threshold: u32,
        bits_per_element: usize,
    ) -> Result<Self>
    where
        S: AsRef<[u8]> + Sync,
    {
        if bits_per_element < 2 {
            return Err(Error::InvalidBitsPerElement(bits_per_element));
        }
        let model = kmer_model.shrink();
        let counts = count_kmers(reference, &model, threshold.saturating_add(1));

        let mut bloom = BloomFilter::new(counts.len(), bits_per_element);
        counts.iter().for_each(|kmer| bloom.insert(kmer));

        info!(
            "Repeat filter holds {} {}-mers seen more than {} times \
             ({} bits, {} hashes, fp rate {:.2e})",
            counts.len(),
            model.size(),
            threshold,
            bloom.bit_len(),
            bloom.hash_count(),
            bloom.false_positive_rate(counts.len())
        );

        Ok(Self {
            model,
            bloom,
            nb_items: counts.len(),
        })
    }

    /// Tests a canonical `(k-1)`-mer, callers canonicalize first
    pub fn contains(&self, canonical: u64) -> bool {
        self.bloom.contains(canonical)
    }

    /// Canonicalizes a `(k-1)`-mer as read and tests it
    pub fn is_repeated(&self, km1mer: u64) -> bool {
        self.contains(self.model.canonical(km1mer))
    }

    /// Number of `(k-1)`-mers inserted
    pub fn len(&self) -> usize {
        self.nb_items
    }

    /// No repeated `(k-1)`-mer was found
    pub fn is_empty(&self) -> bool {
        self.nb_items == 0
    }

    /// Model of the `(k-1)`-mers held by the filter
    pub fn model(&self) -> &KmerModel {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const REFERENCE: &str = "ACGTTGCAAGGCTTACGTTGCAAGGATCCGATAGGCTTACTTTGACCA";

    fn recount(model: &KmerModel, seq: &[u8]) -> HashMap<u64, u32> {
        model
            .kmers(seq)
            .fold(HashMap::new(), |mut counts, kmer| {
                *counts.entry(kmer.canonical).or_default() += 1;
                counts
            })
    }

    #[test]
    fn test_repeated_kmers_are_reported() {
        let model = KmerModel::new(6).unwrap();
        let filter = ReferenceRepeatFilter::build(&[REFERENCE], &model, 1, 12).unwrap();
        let km1 = *filter.model();
        let counts = recount(&km1, REFERENCE.as_bytes());

        assert!(!filter.is_empty());
        counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .for_each(|(kmer, _)| assert!(filter.contains(*kmer)));
        assert_eq!(
            filter.len(),
            counts.values().filter(|count| **count > 1).count()
        );

        let seen_once = counts.iter().filter(|(_, count)| **count == 1).count();
        let positives = counts
            .iter()
            .filter(|(kmer, count)| **count == 1 && filter.contains(**kmer))
            .count();
        assert!(positives * 10 < seen_once.max(10));
    }

    #[test]
    fn test_query_canonicalizes() {
        let model = KmerModel::new(6).unwrap();
        let filter = ReferenceRepeatFilter::build(&[REFERENCE], &model, 1, 12).unwrap();
        let km1 = filter.model();
        // ACGTTGCAAGG occurs twice
        let fwd = km1.encode(b"GTTGC").unwrap();
        assert!(filter.is_repeated(fwd));
        assert!(filter.is_repeated(km1.reverse_complement(fwd)));
    }

    #[test]
    fn test_empty_reference() {
        let model = KmerModel::new(6).unwrap();
        let filter = ReferenceRepeatFilter::build(&[""], &model, 1, 12).unwrap();
        assert!(filter.is_empty());
        assert!(!filter.is_repeated(0));
    }

    #[test]
    fn test_too_few_bits() {
        let model = KmerModel::new(6).unwrap();
        assert!(matches!(
            ReferenceRepeatFilter::build(&[REFERENCE], &model, 1, 1),
            Err(Error::InvalidBitsPerElement(1))
        ));
    }
}
