use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::Duration;

use super::process::{ProcessRecord, ProcessTree};

/// Gap between the two CPU reads. Matches the shortest interval sysinfo
/// reports meaningful CPU deltas for.
pub const DEFAULT_CPU_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("process {0} exited before its details could be read")]
    Vanished(u32),
}

/// Where process data comes from. Implementations read the live OS table;
/// tests and benches replay a fixed one.
pub trait ProcessSource {
    /// Starts the CPU measurement interval for every process and returns
    /// the pids visible at this instant.
    fn begin_interval(&mut self) -> Vec<u32>;

    /// Closes the CPU measurement interval.
    fn end_interval(&mut self);

    /// Reads one process. Individual unreadable metrics come back as
    /// `Reading::Denied`; only a process that is gone is an error.
    fn probe(&self, pid: u32) -> Result<ProcessRecord, ProbeError>;

    /// Logical CPUs, used to turn per-core CPU percent into system percent.
    fn cpu_count(&self) -> usize;

    /// Shortest measurement interval this source produces usable CPU
    /// readings for. `capture` never waits less than this.
    fn min_interval(&self) -> Duration {
        Duration::ZERO
    }
}

/// Every process visible at one point in time.
#[derive(Clone, Debug, Default)]
pub struct ProcessSnapshot {
    records: HashMap<u32, ProcessRecord>,
    cpu_count: usize,
}

impl ProcessSnapshot {
    pub fn from_records(records: Vec<ProcessRecord>, cpu_count: usize) -> Self {
        let records = records.into_iter().map(|r| (r.pid, r)).collect();
        ProcessSnapshot {
            records,
            cpu_count: cpu_count.max(1),
        }
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessRecord> {
        self.records.get(&pid)
    }

    pub fn records(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.records.values()
    }

    pub fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn tree(&self) -> ProcessTree {
        ProcessTree::from_records(self.records.values())
    }
}

/// Two-phase capture: mark every process, wait `interval`, then read.
///
/// Blocks the calling thread for `interval`, raised to the source's
/// `min_interval`. Processes that exit in between are left out of the
/// snapshot.
pub fn capture<S: ProcessSource + ?Sized>(source: &mut S, interval: Duration) -> ProcessSnapshot {
    let _span = tracing::debug_span!("collector.capture").entered();

    let interval = interval.max(source.min_interval());
    let pids = source.begin_interval();
    if !interval.is_zero() {
        thread::sleep(interval);
    }
    source.end_interval();

    let mut records = Vec::with_capacity(pids.len());
    let mut vanished = 0usize;
    for pid in pids {
        match source.probe(pid) {
            Ok(record) => records.push(record),
            Err(err) => {
                vanished += 1;
                tracing::debug!(%err, "dropping process from snapshot");
            }
        }
    }

    tracing::debug!(captured = records.len(), vanished, "process snapshot captured");
    ProcessSnapshot::from_records(records, source.cpu_count())
}

/// Replays a fixed process table. `vanished` pids are listed at the start
/// of the interval but fail to probe, like a process exiting mid-capture.
#[derive(Clone, Debug, Default)]
pub struct StaticSource {
    records: HashMap<u32, ProcessRecord>,
    vanished: HashSet<u32>,
    cpu_count: usize,
}

impl StaticSource {
    pub fn new(records: Vec<ProcessRecord>, cpu_count: usize) -> Self {
        StaticSource {
            records: records.into_iter().map(|r| (r.pid, r)).collect(),
            vanished: HashSet::new(),
            cpu_count: cpu_count.max(1),
        }
    }

    pub fn with_vanished(mut self, pids: impl IntoIterator<Item = u32>) -> Self {
        self.vanished.extend(pids);
        self
    }
}

impl ProcessSource for StaticSource {
    fn begin_interval(&mut self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.records.keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    fn end_interval(&mut self) {}

    fn probe(&self, pid: u32) -> Result<ProcessRecord, ProbeError> {
        if self.vanished.contains(&pid) {
            return Err(ProbeError::Vanished(pid));
        }
        self.records
            .get(&pid)
            .cloned()
            .ok_or(ProbeError::Vanished(pid))
    }

    fn cpu_count(&self) -> usize {
        self.cpu_count
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::system::process::Reading;

    fn record(pid: u32, parent_pid: Option<u32>, memory_percent: f64) -> ProcessRecord {
        ProcessRecord {
            pid,
            parent_pid,
            name: format!("proc{pid}"),
            memory_percent: Reading::Value(memory_percent),
            cpu_percent: Reading::Value(0.0),
            username: Reading::Value("tester".into()),
            memory_bytes: Reading::Value(1024),
        }
    }

    #[derive(Default)]
    struct OrderCheckingSource {
        calls: Vec<&'static str>,
    }

    impl ProcessSource for OrderCheckingSource {
        fn begin_interval(&mut self) -> Vec<u32> {
            self.calls.push("begin");
            vec![1]
        }

        fn end_interval(&mut self) {
            self.calls.push("end");
        }

        fn probe(&self, pid: u32) -> Result<ProcessRecord, ProbeError> {
            assert_eq!(self.calls, ["begin", "end"], "probe before interval closed");
            Ok(record(pid, None, 1.0))
        }

        fn cpu_count(&self) -> usize {
            4
        }
    }

    #[test]
    fn capture_reads_after_interval_closes() {
        let mut source = OrderCheckingSource::default();
        let snapshot = capture(&mut source, Duration::ZERO);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.cpu_count(), 4);
    }

    struct SlowSource {
        minimum: Duration,
        started: Option<Instant>,
        measured: Option<Duration>,
    }

    impl ProcessSource for SlowSource {
        fn begin_interval(&mut self) -> Vec<u32> {
            self.started = Some(Instant::now());
            vec![1]
        }

        fn end_interval(&mut self) {
            self.measured = self.started.map(|t| t.elapsed());
        }

        fn probe(&self, pid: u32) -> Result<ProcessRecord, ProbeError> {
            Ok(record(pid, None, 1.0))
        }

        fn cpu_count(&self) -> usize {
            1
        }

        fn min_interval(&self) -> Duration {
            self.minimum
        }
    }

    #[test]
    fn capture_waits_at_least_source_minimum() {
        let mut source = SlowSource {
            minimum: Duration::from_millis(30),
            started: None,
            measured: None,
        };
        capture(&mut source, Duration::ZERO);
        let measured = source.measured.expect("interval never closed");
        assert!(measured >= Duration::from_millis(30), "sampled after {measured:?}");
    }

    #[test]
    fn static_source_has_no_minimum() {
        let source = StaticSource::new(vec![record(1, None, 1.0)], 1);
        assert_eq!(source.min_interval(), Duration::ZERO);
    }

    #[test]
    fn vanished_process_is_dropped_and_children_become_roots() {
        let mut source = StaticSource::new(
            vec![record(1, None, 1.0), record(2, Some(1), 2.0), record(3, Some(2), 3.0)],
            1,
        )
        .with_vanished([2]);

        let snapshot = capture(&mut source, Duration::ZERO);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get(2).is_none());

        let tree = snapshot.tree();
        assert_eq!(tree.roots(), &[1, 3]);
        assert!(tree.children(1).is_empty());
    }

    #[test]
    fn cpu_count_is_never_zero() {
        let snapshot = ProcessSnapshot::from_records(Vec::new(), 0);
        assert_eq!(snapshot.cpu_count(), 1);
        assert!(snapshot.is_empty());
    }
}
