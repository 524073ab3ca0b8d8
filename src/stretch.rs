//! Solid/gap run tracking with correction of isolated false positive hits.
use crate::kmer::Kmer;

/// Snapshot of a gap confirmed closed by a second consecutive solid k-mer
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GapClosure {
    /// Last solid k-mer before the gap, unknown when the gap opens the record
    pub anchor_begin: Option<Kmer>,
    /// First solid k-mer after the gap
    pub anchor_end: Option<Kmer>,
    /// Number of k-mers in the gap, isolated solid hits included
    pub gap_length: u64,
    /// Length of the solid run closing the gap
    pub solid_length: u64,
}

#[derive(Debug, Clone, Copy)]
struct Previous {
    kmer: Kmer,
    in_index: bool,
}

/// Run state of one record.
///
/// A single solid k-mer inside a gap does not close it: it only closes once a
/// second solid k-mer follows, otherwise it is folded back into the gap. The
/// decision is taken one step late, on the k-mer following the isolated hit.
#[derive(Debug, Clone, Default)]
pub struct StretchState {
    solid_run_length: u64,
    gap_run_length: u64,
    previous: Option<Previous>,
    anchor_begin: Option<Kmer>,
    anchor_end: Option<Kmer>,
}

impl StretchState {
    /// State of a record that has not been walked yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything about the previous record
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Consecutive solid (or ambiguous) k-mers
    pub fn solid_run_length(&self) -> u64 {
        self.solid_run_length
    }

    /// Consecutive k-mers absent from the graph
    pub fn gap_run_length(&self) -> u64 {
        self.gap_run_length
    }

    /// Last solid k-mer before the current gap
    pub fn anchor_begin(&self) -> Option<&Kmer> {
        self.anchor_begin.as_ref()
    }

    /// First solid k-mer of the current run, cleared by a gap k-mer
    pub fn anchor_end(&self) -> Option<&Kmer> {
        self.anchor_end.as_ref()
    }

    /// Last k-mer seen
    pub fn previous_kmer(&self) -> Option<&Kmer> {
        self.previous.as_ref().map(|previous| &previous.kmer)
    }

    /// Moves the state machine by one k-mer, returning the gap it closed if any
    pub fn advance(&mut self, kmer: Kmer, in_index: bool) -> Option<GapClosure> {
        let mut closure = None;

        if !kmer.valid {
            // ambiguous bases never lengthen a gap
            self.solid_run_length += 1;
            if let Some(previous) = self.previous.filter(|prev| prev.kmer.valid && prev.in_index) {
                self.anchor_begin = Some(previous.kmer);
            }
        } else if in_index {
            self.solid_run_length += 1;
            if self.solid_run_length == 1 {
                self.anchor_end = Some(kmer);
            }
            if self.solid_run_length > 1 && self.gap_run_length > 0 {
                closure = Some(GapClosure {
                    anchor_begin: self.anchor_begin,
                    anchor_end: self.anchor_end,
                    gap_length: self.gap_run_length,
                    solid_length: self.solid_run_length,
                });
                self.gap_run_length = 0;
            }
        } else {
            let previous_solid = self
                .previous
                .map_or(false, |prev| prev.kmer.valid && prev.in_index);
            if self.solid_run_length == 1 && previous_solid {
                // isolated hit was a false positive
                self.gap_run_length += 1;
            } else if self.solid_run_length > 1 {
                if let Some(previous) = self.previous.filter(|prev| prev.kmer.valid) {
                    self.anchor_begin = Some(previous.kmer);
                }
            }
            self.anchor_end = None;
            self.gap_run_length += 1;
            self.solid_run_length = 0;
        }

        self.previous = Some(Previous { kmer, in_index });
        closure
    }
}
