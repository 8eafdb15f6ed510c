use std::collections::{HashMap, HashSet};
use std::fmt;

/// A single per-process reading that the OS may refuse to hand out.
#[derive(Clone, Debug, PartialEq)]
pub enum Reading<T> {
    Value(T),
    Denied,
}

impl<T> Reading<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::Denied => None,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Reading::Denied)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reading<U> {
        match self {
            Reading::Value(v) => Reading::Value(f(v)),
            Reading::Denied => Reading::Denied,
        }
    }
}

impl<T> From<Option<T>> for Reading<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reading::Value(v),
            None => Reading::Denied,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Reading<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => v.fmt(f),
            Reading::Denied => f.write_str(ACCESS_DENIED),
        }
    }
}

pub const ACCESS_DENIED: &str = "ACCESS DENIED";

/// One process as captured at snapshot time. Never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    pub name: String,
    pub memory_percent: Reading<f64>,
    /// Percent of one logical core; a process saturating two cores reads 200.
    pub cpu_percent: Reading<f64>,
    pub username: Reading<String>,
    pub memory_bytes: Reading<u64>,
}

impl ProcessRecord {
    pub fn is_self_parented(&self) -> bool {
        self.parent_pid == Some(self.pid)
    }
}

/// Parent/child adjacency over a snapshot. Always a forest.
#[derive(Clone, Debug, Default)]
pub struct ProcessTree {
    children: HashMap<u32, Vec<u32>>,
    roots: Vec<u32>,
}

impl ProcessTree {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ProcessRecord>,
    {
        let mut links: Vec<(u32, Option<u32>)> = records
            .into_iter()
            .map(|r| (r.pid, r.parent_pid))
            .collect();
        links.sort_unstable_by_key(|&(pid, _)| pid);
        links.dedup_by_key(|&mut (pid, _)| pid);
        Self::from_links(&links)
    }

    /// Builds the tree from `(pid, parent_pid)` pairs.
    ///
    /// A process is a root when its parent is unknown, missing from the
    /// input, or the process itself (pid 0 on macOS reports itself as its
    /// parent). Any remaining parent cycle is broken by promoting its
    /// lowest pid to a root.
    pub fn from_links(links: &[(u32, Option<u32>)]) -> Self {
        let mut children: HashMap<u32, Vec<u32>> = links
            .iter()
            .map(|&(pid, _)| (pid, Vec::new()))
            .collect();
        let mut parent_of = HashMap::with_capacity(links.len());
        let mut roots = Vec::new();

        for &(pid, parent) in links {
            match parent {
                Some(ppid) if ppid != pid && children.contains_key(&ppid) => {
                    parent_of.insert(pid, ppid);
                }
                _ => roots.push(pid),
            }
        }

        for (&pid, &ppid) in &parent_of {
            if let Some(siblings) = children.get_mut(&ppid) {
                siblings.push(pid);
            }
        }
        for siblings in children.values_mut() {
            siblings.sort_unstable();
            siblings.dedup();
        }

        let mut tree = ProcessTree { children, roots };
        tree.break_cycles(&mut parent_of);
        tree.roots.sort_unstable();
        tree.roots.dedup();
        tree
    }

    pub fn roots(&self) -> &[u32] {
        &self.roots
    }

    pub fn children(&self, pid: u32) -> &[u32] {
        self.children.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.children.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn pids(&self) -> impl Iterator<Item = u32> + '_ {
        self.children.keys().copied()
    }

    fn break_cycles(&mut self, parent_of: &mut HashMap<u32, u32>) {
        let mut reached = HashSet::with_capacity(self.children.len());
        for root in self.roots.clone() {
            self.mark_reachable(root, &mut reached);
        }
        if reached.len() == self.children.len() {
            return;
        }

        let mut stranded: Vec<u32> = self
            .children
            .keys()
            .copied()
            .filter(|pid| !reached.contains(pid))
            .collect();
        stranded.sort_unstable();

        for pid in stranded {
            if reached.contains(&pid) {
                continue;
            }
            let promoted = cycle_minimum(pid, parent_of);
            if let Some(ppid) = parent_of.remove(&promoted)
                && let Some(siblings) = self.children.get_mut(&ppid)
            {
                siblings.retain(|&c| c != promoted);
            }
            tracing::debug!(pid = promoted, "promoting process in parent cycle to root");
            self.roots.push(promoted);
            self.mark_reachable(promoted, &mut reached);
        }
    }

    fn mark_reachable(&self, from: u32, reached: &mut HashSet<u32>) {
        let mut stack = vec![from];
        while let Some(pid) = stack.pop() {
            if !reached.insert(pid) {
                continue;
            }
            stack.extend(self.children(pid).iter().copied());
        }
    }
}

/// Follows parent links from `start` until a pid repeats, then returns the
/// lowest pid on the loop that was found.
fn cycle_minimum(start: u32, parent_of: &HashMap<u32, u32>) -> u32 {
    let mut seen = HashSet::new();
    let mut current = start;
    while seen.insert(current) {
        match parent_of.get(&current) {
            Some(&ppid) => current = ppid,
            None => return current,
        }
    }

    let on_cycle = current;
    let mut lowest = on_cycle;
    let mut node = parent_of.get(&on_cycle).copied();
    while let Some(pid) = node {
        if pid == on_cycle {
            break;
        }
        lowest = lowest.min(pid);
        node = parent_of.get(&pid).copied();
    }
    lowest
}
