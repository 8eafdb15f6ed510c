use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::process::{ProcessRecord, ProcessTree};
use super::snapshot::ProcessSnapshot;

/// Which resource a chart measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Ram,
    Cpu,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric `{0}`, expected `ram` or `cpu`")]
pub struct ParseMetricError(String);

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Ram => "ram",
            Metric::Cpu => "cpu",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Metric::Ram => "RAM Usage",
            Metric::Cpu => "CPU Usage",
        }
    }

    /// Percent of the whole system used by this process alone. Denied or
    /// nonsensical readings count as nothing.
    pub fn own_usage(self, record: &ProcessRecord, cpu_count: usize) -> f64 {
        let raw = match self {
            Metric::Ram => record.memory_percent.value().copied(),
            Metric::Cpu => record
                .cpu_percent
                .value()
                .map(|&pct| pct / cpu_count.max(1) as f64),
        };
        match raw {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = ParseMetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ram" | "mem" | "memory" => Ok(Metric::Ram),
            "cpu" => Ok(Metric::Cpu),
            _ => Err(ParseMetricError(s.to_string())),
        }
    }
}

/// Own plus descendant usage per pid, for one (snapshot, metric) pair.
#[derive(Clone, Debug)]
pub struct AggregatedUsage {
    metric: Metric,
    totals: HashMap<u32, f64>,
}

impl AggregatedUsage {
    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn get(&self, pid: u32) -> f64 {
        self.totals.get(&pid).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Memoizing subtree summation over a process tree.
pub struct UsageAggregator<'a> {
    snapshot: &'a ProcessSnapshot,
    tree: &'a ProcessTree,
    metric: Metric,
    totals: HashMap<u32, f64>,
}

impl<'a> UsageAggregator<'a> {
    pub fn new(snapshot: &'a ProcessSnapshot, tree: &'a ProcessTree, metric: Metric) -> Self {
        UsageAggregator {
            snapshot,
            tree,
            metric,
            totals: HashMap::with_capacity(tree.len()),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn own(&self, pid: u32) -> f64 {
        self.snapshot
            .get(pid)
            .map(|r| self.metric.own_usage(r, self.snapshot.cpu_count()))
            .unwrap_or(0.0)
    }

    /// Usage of `pid` and everything below it. Each pid is summed at most
    /// once; later calls hit the cache.
    pub fn aggregate(&mut self, pid: u32) -> f64 {
        if let Some(&total) = self.totals.get(&pid) {
            return total;
        }

        let tree = self.tree;
        let mut open = HashSet::new();
        let mut stack = vec![(pid, false)];
        while let Some((current, expanded)) = stack.pop() {
            if self.totals.contains_key(&current) {
                continue;
            }
            if expanded {
                let below: f64 = tree
                    .children(current)
                    .iter()
                    .map(|child| self.totals.get(child).copied().unwrap_or(0.0))
                    .sum();
                let total = self.own(current) + below;
                self.totals.insert(current, total);
                continue;
            }
            if !open.insert(current) {
                continue;
            }
            stack.push((current, true));
            for &child in tree.children(current) {
                if !self.totals.contains_key(&child) && !open.contains(&child) {
                    stack.push((child, false));
                }
            }
        }

        self.totals.get(&pid).copied().unwrap_or(0.0)
    }

    pub fn aggregate_all(mut self) -> AggregatedUsage {
        let tree = self.tree;
        for &root in tree.roots() {
            self.aggregate(root);
        }
        for pid in tree.pids() {
            self.aggregate(pid);
        }
        AggregatedUsage {
            metric: self.metric,
            totals: self.totals,
        }
    }
}
