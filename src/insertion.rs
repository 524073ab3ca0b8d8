//! Observers turning finder events into insertion breakpoints.
use crate::breakpoint::{BreakpointWriter, Classification};
use crate::observer::{GapEvent, GapObserver, KmerEvent, KmerObserver, Shared};
use crate::Result;
use log::debug;
use std::io::Write;

/// Homozygous insertion with no repeat: the gap spans exactly `k - 1` k-mers
#[derive(Debug)]
pub struct CleanInsertion<W: Write> {
    writer: Shared<BreakpointWriter<W>>,
}

impl<W: Write> CleanInsertion<W> {
    /// Observer writing its calls to `writer`
    pub fn new(writer: Shared<BreakpointWriter<W>>) -> Self {
        Self { writer }
    }
}

impl<W: Write> GapObserver for CleanInsertion<W> {
    fn on_gap(&mut self, event: &GapEvent<'_>) -> Result<bool> {
        let (begin, end) = match event.anchors() {
            Some(anchors) => anchors,
            None => return Ok(false),
        };
        if event.gap_length != event.model.size() as u64 - 1 {
            return Ok(false);
        }
        self.writer.borrow_mut().write(
            event.record_name,
            event.breakpoint_position(),
            &event.model.decode(begin.forward),
            &event.model.decode(end.forward),
            0,
            Classification::HomozygousClean,
        )?;
        Ok(true)
    }
}

/// Homozygous insertion next to a short repeat, which shortens the gap by the repeat size
#[derive(Debug)]
pub struct FuzzyInsertion<W: Write> {
    writer: Shared<BreakpointWriter<W>>,
    max_repeat: usize,
}

impl<W: Write> FuzzyInsertion<W> {
    /// Observer accepting repeats of up to `max_repeat` bases
    pub fn new(writer: Shared<BreakpointWriter<W>>, max_repeat: usize) -> Self {
        Self { writer, max_repeat }
    }
}

impl<W: Write> GapObserver for FuzzyInsertion<W> {
    fn on_gap(&mut self, event: &GapEvent<'_>) -> Result<bool> {
        let (begin, end) = match event.anchors() {
            Some(anchors) => anchors,
            None => return Ok(false),
        };
        let expected = event.model.size() as u64 - 1;
        let shortest = expected.saturating_sub(self.max_repeat as u64);
        if event.gap_length < shortest || event.gap_length >= expected {
            return Ok(false);
        }
        self.writer.borrow_mut().write(
            event.record_name,
            event.breakpoint_position(),
            &event.model.decode(begin.forward),
            &event.model.decode(end.forward),
            (expected - event.gap_length) as usize,
            Classification::HomozygousFuzzy,
        )?;
        Ok(true)
    }
}

/// Heterozygous insertion: the reads branch out of the reference and back into it.
///
/// The current k-mer has two predecessors; a k-mer `k - repeat` positions
/// earlier must have two successors, for a repeat of at most `max_repeat`.
/// Neither side may be a repeat of the reference.
#[derive(Debug)]
pub struct HeteroInsertion<W: Write> {
    writer: Shared<BreakpointWriter<W>>,
    max_repeat: usize,
}

impl<W: Write> HeteroInsertion<W> {
    /// Observer accepting repeats of up to `max_repeat` bases
    pub fn new(writer: Shared<BreakpointWriter<W>>, max_repeat: usize) -> Self {
        Self { writer, max_repeat }
    }
}

impl<W: Write> KmerObserver for HeteroInsertion<W> {
    fn on_kmer(&mut self, event: &mut KmerEvent<'_>) -> Result<bool> {
        if event.entry().in_degree != 2 || event.anchor_repeated || event.recent_hetero() > 0 {
            return Ok(false);
        }

        let branch = (0..=self.max_repeat).find_map(|repeat| {
            let entry = event.history.begin_offset(repeat as u8);
            if entry.out_degree == 2 && !entry.is_repeated {
                Some((repeat, entry.kmer))
            } else {
                None
            }
        });
        let (repeat, begin) = match branch {
            Some(branch) => branch,
            None => return Ok(false),
        };

        let classification = if repeat == 0 {
            Classification::HeterozygousClean
        } else {
            Classification::HeterozygousFuzzy
        };
        self.writer.borrow_mut().write(
            event.record_name,
            event.position,
            &event.model.decode(begin),
            &event.model.decode(event.kmer.forward),
            repeat,
            classification,
        )?;
        event.set_recent_hetero(self.max_repeat);
        Ok(true)
    }
}

/// Gap closure nobody claimed
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnclaimedGap {
    /// Record the gap was found on
    pub record_name: String,
    /// Index of the k-mer that closed it
    pub position: u64,
    /// k-mers in the gap
    pub gap_length: u64,
}

/// Fallback observer keeping every gap closure the classifiers passed on
#[derive(Debug, Default)]
pub struct BackupObserver {
    gaps: Vec<UnclaimedGap>,
}

impl BackupObserver {
    /// Empty backup
    pub fn new() -> Self {
        Self::default()
    }

    /// Closures received so far, in order
    pub fn gaps(&self) -> &[UnclaimedGap] {
        &self.gaps
    }
}

impl GapObserver for BackupObserver {
    fn on_gap(&mut self, event: &GapEvent<'_>) -> Result<bool> {
        debug!(
            "Unclassified gap of {} k-mers on {} at {}",
            event.gap_length,
            event.record_name,
            event.breakpoint_position()
        );
        self.gaps.push(UnclaimedGap {
            record_name: event.record_name.to_string(),
            position: event.breakpoint_position(),
            gap_length: event.gap_length,
        });
        Ok(true)
    }
}
