//! Single pass breakpoint finder over the k-mers of each reference record.
use crate::error::Error;
use crate::graph::{GraphOracle, Node};
use crate::history::{HistoryEntry, HistoryWindow};
use crate::kmer::{Kmer, KmerModel};
use crate::observer::{GapEvent, GapObserver, KmerEvent, KmerObserver, Shared};
use crate::repeat::ReferenceRepeatFilter;
use crate::stretch::{GapClosure, StretchState};
use crate::Result;
use log::{debug, warn};

/// Which kinds of sites the finder looks for
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// Gap closures only, no topology history is kept
    Homozygous,
    /// Gap closures and per-k-mer topology for heterozygous sites
    Heterozygous,
}

/// Settings of a [`BreakpointFinder`]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FinderConfig {
    /// k, from 3 to 32
    pub kmer_size: usize,
    /// Largest repeat allowed at a fuzzy breakpoint
    pub max_repeat: usize,
    /// Whether heterozygous sites are looked for
    pub mode: Mode,
    /// `(k-1)`-mers seen more than this many times in the reference are repeats
    pub repeat_threshold: u32,
    /// Bloom filter budget of the repeat filter
    pub bits_per_element: usize,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            kmer_size: crate::DEFAULT_KMER_SIZE,
            max_repeat: crate::DEFAULT_MAX_REPEAT,
            mode: Mode::Heterozygous,
            repeat_threshold: crate::DEFAULT_REPEAT_THRESHOLD,
            bits_per_element: crate::DEFAULT_BITS_PER_ELEMENT,
        }
    }
}

impl FinderConfig {
    /// Rejects settings the finder cannot run with
    pub fn validate(&self) -> Result<()> {
        KmerModel::new(self.kmer_size)?;
        if self.max_repeat + 2 > self.kmer_size {
            return Err(Error::MaxRepeatTooLarge {
                kmer_size: self.kmer_size,
                max_repeat: self.max_repeat,
            });
        }
        if self.bits_per_element < 2 {
            return Err(Error::InvalidBitsPerElement(self.bits_per_element));
        }
        Ok(())
    }
}

/// Counters accumulated over a run
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct ScanStats {
    /// Records scanned
    pub records: u64,
    /// k-mers walked, ambiguous ones included
    pub kmers: u64,
    /// k-mers covering a base other than `ACGT`
    pub invalid_kmers: u64,
    /// Valid k-mers found in the graph
    pub solid_kmers: u64,
    /// Gaps closed by a solid run
    pub gaps_closed: u64,
    /// Closures passed to the fallback
    pub unclaimed_gaps: u64,
}

/// Walks the k-mers of each record, tracks solid and gap stretches and notifies observers.
///
/// Gap observers are all asked about every closure, in registration order. The
/// fallback observer is only asked when none of them claimed it.
pub struct BreakpointFinder<'g, G: GraphOracle> {
    config: FinderConfig,
    model: KmerModel,
    graph: &'g G,
    repeats: ReferenceRepeatFilter,
    stretch: StretchState,
    history: HistoryWindow,
    anchor_repeated: bool,
    recent_hetero: usize,
    record_name: String,
    position: u64,
    gap_observers: Vec<Shared<dyn GapObserver>>,
    kmer_observers: Vec<Shared<dyn KmerObserver>>,
    fallback: Shared<dyn GapObserver>,
    stats: ScanStats,
}

impl<'g, G: GraphOracle> std::fmt::Debug for BreakpointFinder<'g, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BreakpointFinder")
            .field("config", &self.config)
            .field("record_name", &self.record_name)
            .field("position", &self.position)
            .field("stretch", &self.stretch)
            .field("gap_observers", &self.gap_observers.len())
            .field("kmer_observers", &self.kmer_observers.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<'g, G: GraphOracle> BreakpointFinder<'g, G> {
    /// Validates the settings and builds the repeat filter from `reference`, which should
    /// hold the sequences that will be scanned
    pub fn new<S>(
        config: FinderConfig,
        graph: &'g G,
        reference: &[S],
        fallback: Shared<dyn GapObserver>,
    ) -> Result<Self>
    where
        S: AsRef<[u8]> + Sync,
    {
        config.validate()?;
        if graph.kmer_size() != config.kmer_size {
            return Err(Error::KmerSizeMismatch {
                graph: graph.kmer_size(),
                engine: config.kmer_size,
            });
        }
        let model = KmerModel::new(config.kmer_size)?;
        let repeats = ReferenceRepeatFilter::build(
            reference,
            &model,
            config.repeat_threshold,
            config.bits_per_element,
        )?;

        Ok(Self {
            config,
            model,
            graph,
            repeats,
            stretch: StretchState::new(),
            history: HistoryWindow::new(config.kmer_size as u8),
            anchor_repeated: false,
            recent_hetero: 0,
            record_name: String::new(),
            position: 0,
            gap_observers: Vec::new(),
            kmer_observers: Vec::new(),
            fallback,
            stats: ScanStats::default(),
        })
    }

    /// Registers an observer of gap closures, asked after those registered before it
    pub fn add_gap_observer(&mut self, observer: Shared<dyn GapObserver>) {
        self.gap_observers.push(observer);
    }

    /// Registers an observer of every valid k-mer, ignored in homozygous mode
    pub fn add_kmer_observer(&mut self, observer: Shared<dyn KmerObserver>) {
        match self.config.mode {
            Mode::Heterozygous => self.kmer_observers.push(observer),
            Mode::Homozygous => warn!("Homozygous mode, k-mer observer is not registered"),
        }
    }

    /// Scans every record in order
    pub fn run<I, N, S>(&mut self, records: I) -> Result<ScanStats>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<[u8]>,
    {
        for (name, seq) in records {
            self.scan_record(name.as_ref(), seq.as_ref())?;
        }
        Ok(self.stats)
    }

    /// Resets the per-record state and scans one record
    pub fn scan_record(&mut self, name: &str, seq: &[u8]) -> Result<()> {
        self.reset(name);
        let gaps_before = self.stats.gaps_closed;

        let model = self.model;
        for kmer in model.kmers(seq) {
            self.step(kmer)?;
            self.position += 1;
        }

        self.stats.records += 1;
        debug!(
            "Scanned {} ({} k-mers, {} gaps closed)",
            name,
            self.position,
            self.stats.gaps_closed - gaps_before
        );
        Ok(())
    }

    fn reset(&mut self, name: &str) {
        self.stretch.reset();
        self.history.reset();
        self.anchor_repeated = false;
        self.recent_hetero = 0;
        self.position = 0;
        self.record_name.clear();
        self.record_name.push_str(name);
    }

    fn step(&mut self, kmer: Kmer) -> Result<()> {
        let node = Node::from(&kmer);
        let in_index = kmer.valid && self.graph.contains(&node);

        self.stats.kmers += 1;
        if !kmer.valid {
            self.stats.invalid_kmers += 1;
        } else if in_index {
            self.stats.solid_kmers += 1;
        }

        let heterozygous = self.config.mode == Mode::Heterozygous;
        if heterozygous {
            self.record_history(&kmer, &node, in_index);
        }

        let closure = self.stretch.advance(kmer, in_index);

        if heterozygous && kmer.valid {
            self.notify_kmer(kmer)?;
        }
        if let Some(closure) = closure {
            self.notify_gap(closure)?;
        }
        Ok(())
    }

    fn record_history(&mut self, kmer: &Kmer, node: &Node, in_index: bool) {
        let (in_degree, out_degree) = if in_index {
            (self.graph.in_degree(node), self.graph.out_degree(node))
        } else {
            (0, 0)
        };

        self.history.push(HistoryEntry {
            kmer: kmer.forward,
            in_degree,
            out_degree,
            is_repeated: self.repeats.is_repeated(self.model.suffix(kmer.forward)),
        });
        self.anchor_repeated = self.repeats.is_repeated(self.model.prefix(kmer.forward));
        self.recent_hetero = self.recent_hetero.saturating_sub(1);
    }

    fn notify_kmer(&mut self, kmer: Kmer) -> Result<()> {
        for observer in &self.kmer_observers {
            let mut event = KmerEvent::new(
                &self.record_name,
                self.position,
                kmer,
                self.anchor_repeated,
                &self.history,
                &self.model,
                &mut self.recent_hetero,
            );
            observer.borrow_mut().on_kmer(&mut event)?;
        }
        Ok(())
    }

    fn notify_gap(&mut self, closure: GapClosure) -> Result<()> {
        let begin_repeated = match closure.anchor_begin {
            Some(kmer) => self.repeats.is_repeated(self.model.suffix(kmer.forward)),
            None => false,
        };
        let end_repeated = match closure.anchor_end {
            Some(kmer) => self.repeats.is_repeated(self.model.prefix(kmer.forward)),
            None => false,
        };

        let event = GapEvent {
            record_name: &self.record_name,
            position: self.position,
            anchor_begin: closure.anchor_begin,
            anchor_end: closure.anchor_end,
            gap_length: closure.gap_length,
            solid_length: closure.solid_length,
            begin_repeated,
            end_repeated,
            history: &self.history,
            model: &self.model,
        };

        let mut claimed = false;
        for observer in &self.gap_observers {
            // every observer is asked, even once the event is claimed
            claimed |= observer.borrow_mut().on_gap(&event)?;
        }

        self.stats.gaps_closed += 1;
        if !claimed {
            self.stats.unclaimed_gaps += 1;
            self.fallback.borrow_mut().on_gap(&event)?;
        }
        Ok(())
    }

    /// Settings the finder was built with
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// k-mer encoding of the scan
    pub fn model(&self) -> &KmerModel {
        &self.model
    }

    /// Repeated `(k-1)`-mers of the reference
    pub fn repeat_filter(&self) -> &ReferenceRepeatFilter {
        &self.repeats
    }

    /// Current solid run of the record
    pub fn solid_run_length(&self) -> u64 {
        self.stretch.solid_run_length()
    }

    /// Current gap of the record
    pub fn gap_run_length(&self) -> u64 {
        self.stretch.gap_run_length()
    }

    /// Topology of the last k-mers, empty in homozygous mode
    pub fn history(&self) -> &HistoryWindow {
        &self.history
    }

    /// Repeat status of the leading `(k-1)`-mer of the last k-mer
    pub fn anchor_repeated(&self) -> bool {
        self.anchor_repeated
    }

    /// k-mers left before another heterozygous call is allowed
    pub fn recent_hetero(&self) -> usize {
        self.recent_hetero
    }

    /// Suppresses heterozygous calls for the next `distance` k-mers
    pub fn set_recent_hetero(&mut self, distance: usize) {
        self.recent_hetero = distance;
    }

    /// Index of the next k-mer of the current record
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Record being scanned or last scanned
    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// Counters of every record scanned so far
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::count_kmers;
    use crate::graph::KmerGraph;
    use crate::observer::shared;

    /// Records the closures it sees and claims them when told to
    struct Recorder {
        claim: bool,
        seen: Vec<(u64, u64)>,
    }

    impl Recorder {
        fn new(claim: bool) -> Shared<Self> {
            shared(Self {
                claim,
                seen: Vec::new(),
            })
        }
    }

    impl GapObserver for Recorder {
        fn on_gap(&mut self, event: &GapEvent<'_>) -> Result<bool> {
            self.seen.push((event.position, event.gap_length));
            Ok(self.claim)
        }
    }

    /// Claims only closures with both anchors known
    struct Anchored {
        seen: Vec<(u64, u64)>,
    }

    impl GapObserver for Anchored {
        fn on_gap(&mut self, event: &GapEvent<'_>) -> Result<bool> {
            self.seen.push((event.position, event.gap_length));
            Ok(event.anchor_begin.is_some() && event.anchor_end.is_some())
        }
    }

    struct Failing;

    impl GapObserver for Failing {
        fn on_gap(&mut self, _event: &GapEvent<'_>) -> Result<bool> {
            Err(Error::ReadsRecordError("observer failure".to_string()))
        }
    }

    struct KmerCounter {
        seen: u64,
        recent: Vec<usize>,
    }

    impl KmerObserver for KmerCounter {
        fn on_kmer(&mut self, event: &mut KmerEvent<'_>) -> Result<bool> {
            self.seen += 1;
            self.recent.push(event.recent_hetero());
            if event.position == 2 {
                event.set_recent_hetero(3);
            }
            Ok(false)
        }
    }

    const REF: &str = "GATTACAGGCTTCAGTCCATGACGTTAGCAAGTCGGATCCTAGCATCGATTGCA";

    fn config(kmer_size: usize) -> FinderConfig {
        FinderConfig {
            kmer_size,
            max_repeat: 2,
            ..FinderConfig::default()
        }
    }

    fn graph_of(seqs: &[&str], kmer_size: usize) -> KmerGraph {
        let model = KmerModel::new(kmer_size).unwrap();
        KmerGraph::from_counts(model, &count_kmers(seqs, &model, 1))
    }

    #[test]
    fn test_config_validation() {
        assert!(FinderConfig::default().validate().is_ok());
        assert!(matches!(
            config(40).validate(),
            Err(Error::UnsupportedKmerSize(40))
        ));
        let too_much_repeat = FinderConfig {
            kmer_size: 5,
            max_repeat: 4,
            ..FinderConfig::default()
        };
        assert!(matches!(
            too_much_repeat.validate(),
            Err(Error::MaxRepeatTooLarge { .. })
        ));
    }

    #[test]
    fn test_kmer_size_mismatch() {
        let graph = graph_of(&[REF], 7);
        let result = BreakpointFinder::new(config(9), &graph, &[REF], Recorder::new(true));
        assert!(matches!(
            result,
            Err(Error::KmerSizeMismatch {
                graph: 7,
                engine: 9
            })
        ));
    }

    #[test]
    fn test_fully_covered_record() {
        let graph = graph_of(&[REF], 7);
        let fallback = Recorder::new(true);
        let mut finder =
            BreakpointFinder::new(config(7), &graph, &[REF], fallback.clone()).unwrap();
        let stats = finder.run(vec![("chr", REF)]).unwrap();

        assert_eq!(stats.gaps_closed, 0);
        assert_eq!(stats.solid_kmers, (REF.len() - 6) as u64);
        assert_eq!(finder.gap_run_length(), 0);
        assert!(fallback.borrow().seen.is_empty());
    }

    #[test]
    fn test_uncovered_record() {
        let graph = graph_of(&["AAAAAAAAAA"], 7);
        let fallback = Recorder::new(true);
        let mut finder =
            BreakpointFinder::new(config(7), &graph, &[REF], fallback.clone()).unwrap();
        finder.scan_record("chr", REF.as_bytes()).unwrap();

        assert_eq!(finder.solid_run_length(), 0);
        assert_eq!(finder.gap_run_length(), (REF.len() - 6) as u64);
        assert_eq!(finder.stats().gaps_closed, 0);
    }

    #[test]
    fn test_gap_dispatch_asks_every_observer() {
        // reads miss a single base of the reference: 7 k-mers are absent
        let reads = format!("{}{}", &REF[..20], &REF[21..]);
        let graph = graph_of(&[reads.as_str()], 7);
        let fallback = Recorder::new(true);
        let observers = vec![
            Recorder::new(false),
            Recorder::new(false),
            Recorder::new(true),
            Recorder::new(false),
        ];
        let mut finder =
            BreakpointFinder::new(config(7), &graph, &[REF], fallback.clone()).unwrap();
        for observer in &observers {
            finder.add_gap_observer(observer.clone());
        }
        let stats = finder.run(vec![("chr", REF)]).unwrap();

        assert_eq!(stats.gaps_closed, 1);
        assert_eq!(stats.unclaimed_gaps, 0);
        for observer in &observers {
            assert_eq!(observer.borrow().seen, vec![(22, 7)]);
        }
        assert!(fallback.borrow().seen.is_empty());
    }

    #[test]
    fn test_unclaimed_gap_goes_to_fallback_once() {
        let reads = format!("{}{}", &REF[..20], &REF[21..]);
        let graph = graph_of(&[reads.as_str()], 7);
        let fallback = Recorder::new(true);
        let observer = Recorder::new(false);
        let mut finder =
            BreakpointFinder::new(config(7), &graph, &[REF], fallback.clone()).unwrap();
        finder.add_gap_observer(observer.clone());
        let stats = finder.run(vec![("chr", REF)]).unwrap();

        assert_eq!(stats.unclaimed_gaps, 1);
        assert_eq!(observer.borrow().seen.len(), 1);
        assert_eq!(fallback.borrow().seen, vec![(22, 7)]);
    }

    #[test]
    fn test_leading_ambiguous_kmer_is_not_counted_in_gap() {
        // the first 10 k-mers of the reference are missing from the reads
        let graph = graph_of(&[&REF[10..]], 7);
        let fallback = Recorder::new(true);
        let mut finder =
            BreakpointFinder::new(config(7), &graph, &[REF], fallback.clone()).unwrap();
        let record = format!("N{}", REF);
        finder.scan_record("chr", record.as_bytes()).unwrap();

        assert_eq!(finder.stats().invalid_kmers, 1);
        assert_eq!(finder.stats().gaps_closed, 1);
        assert_eq!(fallback.borrow().seen, vec![(12, 10)]);
    }

    #[test]
    fn test_ambiguous_bases_shorten_gap() {
        let reads = format!("{}{}", &REF[..20], &REF[21..]);
        let graph = graph_of(&[reads.as_str()], 7);
        let observer = Recorder::new(true);
        let mut finder =
            BreakpointFinder::new(config(7), &graph, &[REF], Recorder::new(true)).unwrap();
        finder.add_gap_observer(observer.clone());
        // base 17 covers the first 4 k-mers of the gap, only 3 stay absent
        let record = format!("{}N{}", &REF[..17], &REF[18..]);
        finder.scan_record("chr", record.as_bytes()).unwrap();

        assert_eq!(finder.stats().invalid_kmers, 7);
        assert_eq!(finder.stats().gaps_closed, 1);
        assert_eq!(observer.borrow().seen, vec![(22, 3)]);
    }

    #[test]
    fn test_gap_closed_after_ambiguous_bases_goes_to_fallback() {
        let reads = format!("{}{}", &REF[..20], &REF[21..]);
        let graph = graph_of(&[reads.as_str()], 7);
        let fallback = Recorder::new(true);
        let anchored = shared(Anchored { seen: Vec::new() });
        let mut finder =
            BreakpointFinder::new(config(7), &graph, &[REF], fallback.clone()).unwrap();
        finder.add_gap_observer(anchored.clone());
        // ambiguous k-mers right after the gap leave its end anchor unknown
        let record = format!("{}N{}", &REF[..27], &REF[28..]);
        let stats = finder.run(vec![("chr", record.as_str())]).unwrap();

        assert_eq!(stats.invalid_kmers, 7);
        assert_eq!(stats.gaps_closed, 1);
        assert_eq!(stats.unclaimed_gaps, 1);
        assert_eq!(anchored.borrow().seen, vec![(28, 7)]);
        assert_eq!(fallback.borrow().seen, vec![(28, 7)]);
    }

    #[test]
    fn test_observer_errors_propagate() {
        let reads = format!("{}{}", &REF[..20], &REF[21..]);
        let graph = graph_of(&[reads.as_str()], 7);
        let mut finder =
            BreakpointFinder::new(config(7), &graph, &[REF], Recorder::new(true)).unwrap();
        finder.add_gap_observer(shared(Failing));
        assert!(finder.scan_record("chr", REF.as_bytes()).is_err());
    }

    #[test]
    fn test_state_is_reset_between_records() {
        let graph = graph_of(&[&REF[..30]], 7);
        let mut finder =
            BreakpointFinder::new(config(7), &graph, &[REF], Recorder::new(true)).unwrap();
        finder.scan_record("first", REF.as_bytes()).unwrap();
        assert!(finder.gap_run_length() > 0);

        finder.scan_record("second", &REF.as_bytes()[..20]).unwrap();
        assert_eq!(finder.gap_run_length(), 0);
        assert_eq!(finder.solid_run_length(), 14);
        assert_eq!(finder.position(), 14);
        assert_eq!(finder.history().len(), 14);
        assert_eq!(finder.record_name(), "second");
    }

    #[test]
    fn test_history_records_topology() {
        let graph = graph_of(&["GACTTA", "GACTTC"], 3);
        let short = FinderConfig {
            kmer_size: 3,
            max_repeat: 1,
            ..FinderConfig::default()
        };
        let mut finder =
            BreakpointFinder::new(short, &graph, &["GACTTA"], Recorder::new(true)).unwrap();
        finder.scan_record("chr", b"GACTT").unwrap();

        let ctt = finder.history().end();
        assert_eq!(finder.model().decode(ctt.kmer), "CTT");
        assert_eq!(ctt.out_degree, 2);
        assert_eq!(
            finder.history().lookback(2).map(|entry| entry.kmer),
            finder.model().encode(b"GAC")
        );
    }

    #[test]
    fn test_recent_hetero_decays() {
        let graph = graph_of(&[REF], 7);
        let mut finder =
            BreakpointFinder::new(config(7), &graph, &[REF], Recorder::new(true)).unwrap();
        let counter = shared(KmerCounter {
            seen: 0,
            recent: Vec::new(),
        });
        finder.add_kmer_observer(counter.clone());
        finder.scan_record("chr", &REF.as_bytes()[..14]).unwrap();

        assert_eq!(counter.borrow().seen, 8);
        assert_eq!(counter.borrow().recent, vec![0, 0, 0, 2, 1, 0, 0, 0]);
        assert_eq!(finder.recent_hetero(), 0);
    }

    #[test]
    fn test_homozygous_mode_skips_kmer_observers() {
        let graph = graph_of(&[REF], 7);
        let homozygous = FinderConfig {
            mode: Mode::Homozygous,
            ..config(7)
        };
        let mut finder =
            BreakpointFinder::new(homozygous, &graph, &[REF], Recorder::new(true)).unwrap();
        let counter = shared(KmerCounter {
            seen: 0,
            recent: Vec::new(),
        });
        finder.add_kmer_observer(counter.clone());
        finder.scan_record("chr", REF.as_bytes()).unwrap();

        assert_eq!(counter.borrow().seen, 0);
        assert!(finder.history().is_empty());
    }
}
