//! 2-bit k-mer encoding and the rolling k-mer iterator over a record.
use crate::error::Error;
use crate::Result;

/// Smallest supported k-mer size, the repeat filter works on `k - 1`
pub const MIN_KMER_SIZE: usize = 3;
/// Largest k-mer size that fits the `u64` encoding
pub const MAX_KMER_SIZE: usize = 32;

/// Orientation of a k-mer relative to its canonical form
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Strand {
    /// Forward value is the canonical value
    Forward,
    /// Reverse complement is the canonical value
    Reverse,
}

/// One position of a record as seen by the finder.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Kmer {
    /// Smaller of the forward value and its reverse complement
    pub canonical: u64,
    /// Value as read on the record
    pub forward: u64,
    /// Strand the canonical value was read from
    pub strand: Strand,
    /// False when the window covers a base other than `ACGT`
    pub valid: bool,
}

/// Encoding parameters for k-mers of a fixed size.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct KmerModel {
    size: usize,
    mask: u64,
}

impl KmerModel {
    /// Creates a model for `size`, failing for sizes the `u64` encoding cannot hold
    pub fn new(size: usize) -> Result<Self> {
        if !(MIN_KMER_SIZE..=MAX_KMER_SIZE).contains(&size) {
            return Err(Error::UnsupportedKmerSize(size));
        }
        let mask = if size == MAX_KMER_SIZE {
            u64::MAX
        } else {
            (1u64 << (2 * size)) - 1
        };
        Ok(Self { size, mask })
    }

    /// k
    pub fn size(&self) -> usize {
        self.size
    }

    /// Model for the `(k-1)`-mers used by the repeat filter
    pub fn shrink(&self) -> Self {
        Self {
            size: self.size - 1,
            mask: self.mask >> 2,
        }
    }

    /// Reverse complement of an encoded k-mer
    pub fn reverse_complement(&self, value: u64) -> u64 {
        let mut rc = !value;
        rc = ((rc >> 2) & 0x3333_3333_3333_3333) | ((rc & 0x3333_3333_3333_3333) << 2);
        rc = ((rc >> 4) & 0x0F0F_0F0F_0F0F_0F0F) | ((rc & 0x0F0F_0F0F_0F0F_0F0F) << 4);
        rc = ((rc >> 8) & 0x00FF_00FF_00FF_00FF) | ((rc & 0x00FF_00FF_00FF_00FF) << 8);
        rc = ((rc >> 16) & 0x0000_FFFF_0000_FFFF) | ((rc & 0x0000_FFFF_0000_FFFF) << 16);
        rc = rc.rotate_left(32);
        rc >> (64 - 2 * self.size)
    }

    /// Smaller of `value` and its reverse complement
    pub fn canonical(&self, value: u64) -> u64 {
        value.min(self.reverse_complement(value))
    }

    /// Canonical value and the strand `value` was read on
    pub fn orient(&self, value: u64) -> (u64, Strand) {
        let rc = self.reverse_complement(value);
        if value <= rc {
            (value, Strand::Forward)
        } else {
            (rc, Strand::Reverse)
        }
    }

    /// Leading `(k-1)`-mer of an encoded k-mer
    pub fn prefix(&self, value: u64) -> u64 {
        (value & self.mask) >> 2
    }

    /// Trailing `(k-1)`-mer of an encoded k-mer
    pub fn suffix(&self, value: u64) -> u64 {
        value & (self.mask >> 2)
    }

    /// Appends `base` (2-bit code) dropping the leading base
    pub fn push_back(&self, value: u64, base: u64) -> u64 {
        ((value << 2) | base) & self.mask
    }

    /// Prepends `base` (2-bit code) dropping the trailing base
    pub fn push_front(&self, value: u64, base: u64) -> u64 {
        (base << (2 * (self.size - 1))) | (value >> 2)
    }

    /// Encodes exactly `k` bases, `None` if the length differs or a base is not `ACGT`
    pub fn encode(&self, seq: &[u8]) -> Option<u64> {
        if seq.len() != self.size {
            return None;
        }
        seq.iter()
            .try_fold(0u64, |value, base| Some((value << 2) | encode_base(*base)?))
    }

    /// Uppercase nucleotide string of an encoded k-mer
    pub fn decode(&self, value: u64) -> String {
        (0..self.size)
            .rev()
            .map(|i| crate::NUCLEOTIDES[((value >> (2 * i)) & 3) as usize] as char)
            .collect()
    }

    /// Iterates the k-mers of `seq`, one per position, including invalid ones
    pub fn kmers<'a>(&'a self, seq: &'a [u8]) -> KmerIter<'a> {
        KmerIter {
            model: self,
            seq,
            next: 0,
            forward: 0,
            reverse: 0,
            last_invalid: None,
        }
    }
}

/// 2-bit code of a nucleotide
#[inline]
pub fn encode_base(base: u8) -> Option<u64> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

/// Rolling iterator producing one [`Kmer`] per window of a sequence
#[derive(Debug)]
pub struct KmerIter<'a> {
    model: &'a KmerModel,
    seq: &'a [u8],
    next: usize,
    forward: u64,
    reverse: u64,
    last_invalid: Option<usize>,
}

impl<'a> KmerIter<'a> {
    fn push(&mut self, idx: usize) {
        let code = match encode_base(self.seq[idx]) {
            Some(code) => code,
            None => {
                self.last_invalid = Some(idx);
                0
            }
        };
        self.forward = self.model.push_back(self.forward, code);
        self.reverse = self.model.push_front(self.reverse, 3 - code);
    }
}

impl<'a> Iterator for KmerIter<'a> {
    type Item = Kmer;

    fn next(&mut self) -> Option<Kmer> {
        let k = self.model.size;
        let end = self.next + k;
        if end > self.seq.len() {
            return None;
        }

        if self.next == 0 {
            (0..k).for_each(|idx| self.push(idx));
        } else {
            self.push(end - 1);
        }

        let valid = self.last_invalid.map_or(true, |idx| idx < self.next);
        let (canonical, strand) = if self.forward <= self.reverse {
            (self.forward, Strand::Forward)
        } else {
            (self.reverse, Strand::Reverse)
        };
        self.next += 1;

        Some(Kmer {
            canonical,
            forward: self.forward,
            strand,
            valid,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.seq.len() + 1).saturating_sub(self.next + self.model.size);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_sizes() {
        assert!(matches!(
            KmerModel::new(2),
            Err(Error::UnsupportedKmerSize(2))
        ));
        assert!(matches!(
            KmerModel::new(33),
            Err(Error::UnsupportedKmerSize(33))
        ));
        assert!(KmerModel::new(32).is_ok());
    }

    #[test]
    fn test_reverse_complement() {
        let model = KmerModel::new(5).unwrap();
        let fwd = model.encode(b"ACCGT").unwrap();
        let rc = model.encode(b"ACGGT").unwrap();
        assert_eq!(model.reverse_complement(fwd), rc);
        assert_eq!(model.canonical(rc), fwd);
        assert_eq!(model.decode(model.reverse_complement(fwd)), "ACGGT");

        let model = KmerModel::new(32).unwrap();
        let all_a = model.encode(&[b'A'; 32]).unwrap();
        assert_eq!(model.reverse_complement(all_a), u64::MAX);
    }

    #[test]
    fn test_prefix_suffix() {
        let model = KmerModel::new(4).unwrap();
        let shrunk = model.shrink();
        let kmer = model.encode(b"GATC").unwrap();
        assert_eq!(shrunk.decode(model.prefix(kmer)), "GAT");
        assert_eq!(shrunk.decode(model.suffix(kmer)), "ATC");
    }

    #[test]
    fn test_kmer_iter() {
        let model = KmerModel::new(3).unwrap();
        let kmers = model.kmers(b"acGTT").collect::<Vec<Kmer>>();
        assert_eq!(kmers.len(), 3);
        assert_eq!(model.decode(kmers[0].forward), "ACG");
        assert_eq!(model.decode(kmers[2].forward), "GTT");
        assert_eq!(model.decode(kmers[2].canonical), "AAC");
        assert_eq!(kmers[2].strand, Strand::Reverse);
        assert_eq!(kmers[0].strand, Strand::Forward);
        assert!(kmers.iter().all(|kmer| kmer.valid));
    }

    #[test]
    fn test_kmer_iter_invalid_bases() {
        let model = KmerModel::new(3).unwrap();
        let valid = model
            .kmers(b"ACNGTAC")
            .map(|kmer| kmer.valid)
            .collect::<Vec<bool>>();
        assert_eq!(valid, vec![false, false, false, true, true]);
    }

    #[test]
    fn test_short_sequence() {
        let model = KmerModel::new(5).unwrap();
        assert_eq!(model.kmers(b"ACGT").count(), 0);
        assert_eq!(model.kmers(b"ACGTA").size_hint(), (1, Some(1)));
    }
}
