//! Notification interfaces between the finder and the breakpoint classifiers.
use crate::history::{HistoryEntry, HistoryWindow};
use crate::kmer::{Kmer, KmerModel};
use crate::Result;
use std::cell::RefCell;
use std::rc::Rc;

/// Observer handle shared between the caller and the finder, so it can be inspected after the scan
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps an observer for registration
pub fn shared<T>(observer: T) -> Shared<T> {
    Rc::new(RefCell::new(observer))
}

/// Everything known about a gap at the moment it is confirmed closed
#[derive(Debug)]
pub struct GapEvent<'a> {
    /// Name of the record being scanned
    pub record_name: &'a str,
    /// Index of the k-mer confirming the closure, `anchor_end` sits one position before
    pub position: u64,
    /// Last solid k-mer before the gap
    pub anchor_begin: Option<Kmer>,
    /// First solid k-mer after the gap, unknown after ambiguous bases
    pub anchor_end: Option<Kmer>,
    /// k-mers in the gap
    pub gap_length: u64,
    /// Solid run that closed the gap
    pub solid_length: u64,
    /// Trailing `(k-1)`-mer of `anchor_begin` is repeated in the reference
    pub begin_repeated: bool,
    /// Leading `(k-1)`-mer of `anchor_end` is repeated in the reference
    pub end_repeated: bool,
    /// Topology of the last k-mers
    pub history: &'a HistoryWindow,
    /// k-mer encoding of the scan
    pub model: &'a KmerModel,
}

impl<'a> GapEvent<'a> {
    /// Both anchors, when the gap is bounded on each side
    pub fn anchors(&self) -> Option<(Kmer, Kmer)> {
        Some((self.anchor_begin?, self.anchor_end?))
    }

    /// Breakpoint coordinate: start of `anchor_end` on the record
    pub fn breakpoint_position(&self) -> u64 {
        self.position.saturating_sub(1)
    }
}

/// Per-k-mer view handed to k-mer observers
#[derive(Debug)]
pub struct KmerEvent<'a> {
    /// Record being scanned
    pub record_name: &'a str,
    /// Index of the current k-mer
    pub position: u64,
    /// Current k-mer
    pub kmer: Kmer,
    /// Leading `(k-1)`-mer of the current k-mer is repeated in the reference
    pub anchor_repeated: bool,
    /// Topology of the last k-mers
    pub history: &'a HistoryWindow,
    /// k-mer encoding of the scan
    pub model: &'a KmerModel,
    recent_hetero: &'a mut usize,
}

impl<'a> KmerEvent<'a> {
    /// Event for the k-mer at `position`
    pub fn new(
        record_name: &'a str,
        position: u64,
        kmer: Kmer,
        anchor_repeated: bool,
        history: &'a HistoryWindow,
        model: &'a KmerModel,
        recent_hetero: &'a mut usize,
    ) -> Self {
        Self {
            record_name,
            position,
            kmer,
            anchor_repeated,
            history,
            model,
            recent_hetero,
        }
    }

    /// History entry of the current k-mer
    pub fn entry(&self) -> &HistoryEntry {
        self.history.end()
    }

    /// Positions left before another heterozygous call is allowed
    pub fn recent_hetero(&self) -> usize {
        *self.recent_hetero
    }

    /// Suppresses heterozygous calls for the next `distance` positions
    pub fn set_recent_hetero(&mut self, distance: usize) {
        *self.recent_hetero = distance;
    }
}

/// Consumer of gap closures. Returns whether it claimed the event.
pub trait GapObserver {
    /// Handles a closed gap
    fn on_gap(&mut self, event: &GapEvent<'_>) -> Result<bool>;
}

/// Consumer of every valid k-mer. Returns whether it recorded something.
pub trait KmerObserver {
    /// Handles a valid k-mer
    fn on_kmer(&mut self, event: &mut KmerEvent<'_>) -> Result<bool>;
}
