//! Fixed-size Bloom filter over encoded k-mers.

/// Capacity used when the expected number of items is zero
pub const MIN_BLOOM_ITEMS: usize = 1_000;

/// Probabilistic set of `u64` items, false positives possible and no false negatives.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    nbits: u64,
    nb_hash: usize,
}

impl BloomFilter {
    /// Sizes the filter for `items` elements at `bits_per_element` bits each.
    /// The number of hash functions is `floor(0.7 * bits_per_element)`.
    pub fn new(items: usize, bits_per_element: usize) -> Self {
        let items = if items == 0 { MIN_BLOOM_ITEMS } else { items };
        let nbits = (items as u64 * bits_per_element as u64).max(64);
        let nb_hash = ((0.7 * bits_per_element as f64).floor() as usize).max(1);

        Self {
            bits: vec![0; ((nbits + 63) / 64) as usize],
            nbits,
            nb_hash,
        }
    }

    /// Number of hash functions
    pub fn hash_count(&self) -> usize {
        self.nb_hash
    }

    /// Size of the bit array
    pub fn bit_len(&self) -> u64 {
        self.nbits
    }

    /// Sets the bits of `item`
    pub fn insert(&mut self, item: u64) {
        let (h1, h2) = hash_pair(item);
        for i in 0..self.nb_hash as u64 {
            let bit = h1.wrapping_add(i.wrapping_mul(h2)) % self.nbits;
            self.bits[(bit / 64) as usize] |= 1u64 << (bit % 64);
        }
    }

    /// False positives are possible, false negatives are not
    pub fn contains(&self, item: u64) -> bool {
        let (h1, h2) = hash_pair(item);
        (0..self.nb_hash as u64).all(|i| {
            let bit = h1.wrapping_add(i.wrapping_mul(h2)) % self.nbits;
            self.bits[(bit / 64) as usize] & (1u64 << (bit % 64)) != 0
        })
    }

    /// Expected false positive rate once `items` elements are inserted
    pub fn false_positive_rate(&self, items: usize) -> f64 {
        let k = self.nb_hash as f64;
        (1.0 - (-k * items as f64 / self.nbits as f64).exp()).powf(k)
    }
}

fn mix(mut hash: u64) -> u64 {
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51_afd7_ed55_8ccd);
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    hash ^ (hash >> 33)
}

/// Two independent hashes for double hashing, the second one is odd so the bit positions
/// never collapse
fn hash_pair(item: u64) -> (u64, u64) {
    let h1 = mix(item);
    let h2 = mix(item ^ 0x9e37_79b9_7f4a_7c15) | 1;
    (h1, h2)
}
