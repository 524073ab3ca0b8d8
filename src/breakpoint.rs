//! Breakpoint records: classification, FASTA serialization and parsing back.
use crate::error::Error;
use crate::Result;
use log::debug;
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

const LEFT_PREFIX: &str = "left_contig_";
const RIGHT_PREFIX: &str = "right_contig_";

/// Kind of insertion site
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Classification {
    /// `HOM-clean`, gap of exactly `k - 1` k-mers
    HomozygousClean,
    /// `HOM-fuzzy`, gap shortened by a repeat
    HomozygousFuzzy,
    /// `HET-clean`, branch out and back into the reference
    HeterozygousClean,
    /// `HET-fuzzy`, branch shortened by a repeat
    HeterozygousFuzzy,
}

impl Classification {
    /// Label used in breakpoint headers
    pub fn label(self) -> &'static str {
        match self {
            Classification::HomozygousClean => "HOM-clean",
            Classification::HomozygousFuzzy => "HOM-fuzzy",
            Classification::HeterozygousClean => "HET-clean",
            Classification::HeterozygousFuzzy => "HET-fuzzy",
        }
    }

    /// HOM classifications
    pub fn is_homozygous(self) -> bool {
        match self {
            Classification::HomozygousClean | Classification::HomozygousFuzzy => true,
            _ => false,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Classification {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "HOM-clean" => Ok(Classification::HomozygousClean),
            "HOM-fuzzy" => Ok(Classification::HomozygousFuzzy),
            "HET-clean" => Ok(Classification::HeterozygousClean),
            "HET-fuzzy" => Ok(Classification::HeterozygousFuzzy),
            _ => Err(Error::MalformedBreakpointHeader(s.to_string())),
        }
    }
}

/// A reported insertion site with its flanking k-mers
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BreakpointEvent {
    /// Rank in the output, from 0
    pub id: u64,
    /// Reference record
    pub record_name: String,
    /// 0-based position on the record
    pub position: u64,
    /// k-mer on the left of the insertion
    pub begin_sequence: String,
    /// k-mer on the right of the insertion
    pub end_sequence: String,
    /// Repeat shortening the gap, 0 for clean sites
    pub repeat_size: usize,
    /// Kind of site
    pub classification: Classification,
}

impl BreakpointEvent {
    fn header(&self, prefix: &str) -> String {
        format!(
            "{}{}_{}_pos_{}_repeat_{}_{}",
            prefix, self.id, self.record_name, self.position, self.repeat_size, self.classification
        )
    }

    /// Parses the header of a left (or right) entry, taking the sequence from the pair
    fn from_pair(left: &bio::io::fasta::Record, right: &bio::io::fasta::Record) -> Result<Self> {
        let malformed = || Error::MalformedBreakpointHeader(left.id().to_string());
        let left_fields = left.id().strip_prefix(LEFT_PREFIX).ok_or_else(malformed)?;
        let right_fields = right
            .id()
            .strip_prefix(RIGHT_PREFIX)
            .ok_or_else(|| Error::MalformedBreakpointHeader(right.id().to_string()))?;
        if left_fields != right_fields {
            return Err(Error::MalformedBreakpointHeader(right.id().to_string()));
        }

        // record names may hold underscores, so fields are taken from both ends
        let mut tail = left_fields.rsplitn(5, '_');
        let classification = tail
            .next()
            .ok_or_else(malformed)?
            .parse::<Classification>()?;
        let repeat_size = tail.next().and_then(|f| f.parse::<usize>().ok()).ok_or_else(malformed)?;
        if tail.next() != Some("repeat") {
            return Err(malformed());
        }
        let position = tail.next().and_then(|f| f.parse::<u64>().ok()).ok_or_else(malformed)?;
        let head = tail.next().and_then(|f| f.strip_suffix("_pos")).ok_or_else(malformed)?;

        let mut head = head.splitn(2, '_');
        let id = head.next().and_then(|f| f.parse::<u64>().ok()).ok_or_else(malformed)?;
        let record_name = head.next().ok_or_else(malformed)?.to_string();

        Ok(Self {
            id,
            record_name,
            position,
            begin_sequence: String::from_utf8(left.seq().to_vec())?,
            end_sequence: String::from_utf8(right.seq().to_vec())?,
            repeat_size,
            classification,
        })
    }
}

/// Number of breakpoints written per classification
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct CallStats {
    /// `HOM-clean` calls
    pub homozygous_clean: u64,
    /// `HOM-fuzzy` calls
    pub homozygous_fuzzy: u64,
    /// `HET-clean` calls
    pub heterozygous_clean: u64,
    /// `HET-fuzzy` calls
    pub heterozygous_fuzzy: u64,
}

impl CallStats {
    fn record(&mut self, classification: Classification) {
        match classification {
            Classification::HomozygousClean => self.homozygous_clean += 1,
            Classification::HomozygousFuzzy => self.homozygous_fuzzy += 1,
            Classification::HeterozygousClean => self.heterozygous_clean += 1,
            Classification::HeterozygousFuzzy => self.heterozygous_fuzzy += 1,
        }
    }

    /// Calls of one classification
    pub fn get(&self, classification: Classification) -> u64 {
        match classification {
            Classification::HomozygousClean => self.homozygous_clean,
            Classification::HomozygousFuzzy => self.homozygous_fuzzy,
            Classification::HeterozygousClean => self.heterozygous_clean,
            Classification::HeterozygousFuzzy => self.heterozygous_fuzzy,
        }
    }

    /// Calls of every classification
    pub fn total(&self) -> u64 {
        self.homozygous_clean
            + self.homozygous_fuzzy
            + self.heterozygous_clean
            + self.heterozygous_fuzzy
    }
}

/// Writes breakpoints as pairs of FASTA entries, numbering them from 0
#[derive(Debug)]
pub struct BreakpointWriter<W: Write> {
    out: W,
    next_id: u64,
    stats: CallStats,
}

impl<W: Write> BreakpointWriter<W> {
    /// Writer numbering from 0
    pub fn new(out: W) -> Self {
        Self {
            out,
            next_id: 0,
            stats: CallStats::default(),
        }
    }

    /// Writes one breakpoint and returns the id it was given
    pub fn write(
        &mut self,
        record_name: &str,
        position: u64,
        begin_sequence: &str,
        end_sequence: &str,
        repeat_size: usize,
        classification: Classification,
    ) -> Result<u64> {
        let event = BreakpointEvent {
            id: self.next_id,
            record_name: record_name.to_string(),
            position,
            begin_sequence: begin_sequence.to_string(),
            end_sequence: end_sequence.to_string(),
            repeat_size,
            classification,
        };
        self.write_event(&event)?;
        Ok(event.id)
    }

    /// Writes an already built event, its id is replaced by the next one
    pub fn write_event(&mut self, event: &BreakpointEvent) -> Result<()> {
        let id = self.next_id;
        let event = BreakpointEvent { id, ..event.clone() };
        self.write_pair(&event).map_err(Error::OutputError)?;

        debug!(
            "Breakpoint {} on {} at {} ({}, repeat {})",
            id, event.record_name, event.position, event.classification, event.repeat_size
        );
        self.next_id += 1;
        self.stats.record(event.classification);
        Ok(())
    }

    fn write_pair(&mut self, event: &BreakpointEvent) -> std::io::Result<()> {
        writeln!(self.out, ">{}", event.header(LEFT_PREFIX))?;
        writeln!(self.out, "{}", event.begin_sequence)?;
        writeln!(self.out, ">{}", event.header(RIGHT_PREFIX))?;
        writeln!(self.out, "{}", event.end_sequence)
    }

    /// Calls written so far
    pub fn stats(&self) -> &CallStats {
        &self.stats
    }

    /// Flushes the underlying output
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush().map_err(Error::OutputError)
    }

    /// Underlying output
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Gives the output back
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Reads a breakpoint file back, entries are taken two by two
pub fn read_breakpoints<R: Read>(rdr: R) -> Result<Vec<BreakpointEvent>> {
    let records = bio::io::fasta::Reader::new(rdr)
        .records()
        .collect::<std::io::Result<Vec<_>>>()?;
    if records.len() % 2 != 0 {
        return Err(Error::OddBreakpointFile(records.len()));
    }

    records
        .chunks(2)
        .map(|pair| BreakpointEvent::from_pair(&pair[0], &pair[1]))
        .collect()
}
