//! Ring buffer of per-k-mer topology used to look back for heterozygous sites.
//!
//! The buffer has 256 slots addressed by `u8` cursors that wrap on their own, so
//! no modulo is needed. One slot is always the one being overwritten next, hence
//! at most [`MAX_WINDOW`] positions are retrievable: heterozygous analysis
//! cannot look further back than that.

/// Number of slots in the ring
pub const HISTORY_CAPACITY: usize = 256;
/// Longest look-back the ring can answer
pub const MAX_WINDOW: usize = HISTORY_CAPACITY - 1;

/// Topology and repeat status recorded for one k-mer.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct HistoryEntry {
    /// Forward value of the k-mer
    pub kmer: u64,
    /// Predecessors in the graph, 0 for a gap k-mer
    pub in_degree: usize,
    /// Successors in the graph, 0 for a gap k-mer
    pub out_degree: usize,
    /// Whether the trailing `(k-1)`-mer is over-represented in the reference
    pub is_repeated: bool,
}

/// History of the last [`MAX_WINDOW`] k-mers of a record with two cursors
/// `window` positions apart.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    entries: Box<[HistoryEntry; HISTORY_CAPACITY]>,
    window: u8,
    end_index: u8,
    begin_index: u8,
    filled: usize,
}

impl HistoryWindow {
    /// Window whose begin cursor trails the end cursor by `window` positions
    pub fn new(window: u8) -> Self {
        let mut history = Self {
            entries: Box::new([HistoryEntry::default(); HISTORY_CAPACITY]),
            window,
            end_index: 0,
            begin_index: 0,
            filled: 0,
        };
        history.reset();
        history
    }

    /// Clears every slot and puts the cursors back to their initial positions
    pub fn reset(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = HistoryEntry::default());
        self.end_index = 0;
        self.begin_index = 0u8.wrapping_sub(self.window);
        self.filled = 0;
    }

    /// Stores the entry of the current k-mer and moves both cursors
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries[self.end_index as usize] = entry;
        self.end_index = self.end_index.wrapping_add(1);
        self.begin_index = self.begin_index.wrapping_add(1);
        self.filled = (self.filled + 1).min(MAX_WINDOW);
    }

    /// Entry of the most recent k-mer
    pub fn end(&self) -> &HistoryEntry {
        &self.entries[self.end_index.wrapping_sub(1) as usize]
    }

    /// Entry `window` positions before the most recent one
    pub fn begin(&self) -> &HistoryEntry {
        self.begin_offset(0)
    }

    /// Entry `offset` positions after the begin cursor
    pub fn begin_offset(&self, offset: u8) -> &HistoryEntry {
        let idx = self.begin_index.wrapping_sub(1).wrapping_add(offset);
        &self.entries[idx as usize]
    }

    /// Entry `distance` positions before the most recent one, `None` past what the ring still holds
    pub fn lookback(&self, distance: usize) -> Option<&HistoryEntry> {
        if distance >= self.filled {
            return None;
        }
        let idx = self.end_index.wrapping_sub(1).wrapping_sub(distance as u8);
        Some(&self.entries[idx as usize])
    }

    /// Distance between the two cursors
    pub fn window(&self) -> u8 {
        self.window
    }

    /// Slot the next entry goes to
    pub fn end_index(&self) -> u8 {
        self.end_index
    }

    /// Slot following the begin entry
    pub fn begin_index(&self) -> u8 {
        self.begin_index
    }

    /// Number of retrievable entries
    pub fn len(&self) -> usize {
        self.filled
    }

    /// True until the first k-mer of the record
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }
}
