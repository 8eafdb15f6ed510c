use serde::Serialize;

use crate::format::format_bytes;
use crate::system::aggregate::{AggregatedUsage, Metric, UsageAggregator};
use crate::system::process::{ProcessRecord, ProcessTree, Reading};
use crate::system::snapshot::ProcessSnapshot;
use crate::sunburst::color::Colormap;
use crate::sunburst::hit::HitTester;
use crate::sunburst::layout::{LayoutOptions, RadialLayoutEngine};
use crate::sunburst::node::{Bounds, Point, UsageForest, Wedge, update_bounds};

#[derive(Clone, Debug, PartialEq)]
pub struct ChartOptions {
    pub theme: String,
    pub layout: LayoutOptions,
    pub center: Point,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            theme: crate::sunburst::color::DEFAULT_COLORMAP.to_string(),
            layout: LayoutOptions::default(),
            center: Point::new(0.5, 0.5),
        }
    }
}

struct ForestView<'a> {
    tree: &'a ProcessTree,
    usage: &'a AggregatedUsage,
}

impl UsageForest for ForestView<'_> {
    fn roots(&self) -> &[u32] {
        self.tree.roots()
    }

    fn children(&self, id: u32) -> &[u32] {
        self.tree.children(id)
    }

    fn usage(&self, id: u32) -> f64 {
        self.usage.get(id)
    }
}

/// A laid-out chart together with the snapshot it was built from.
pub struct Chart {
    metric: Metric,
    snapshot: ProcessSnapshot,
    tree: ProcessTree,
    usage: AggregatedUsage,
    engine: RadialLayoutEngine,
    center: Point,
    wedges: Vec<Wedge>,
    bounds: Bounds,
}

/// Snapshot -> tree -> aggregate -> layout, in one blocking call.
pub fn build_chart(snapshot: ProcessSnapshot, metric: Metric, options: &ChartOptions) -> Chart {
    let _span = tracing::debug_span!("chart.layout", %metric).entered();

    let tree = snapshot.tree();
    let usage = UsageAggregator::new(&snapshot, &tree, metric).aggregate_all();
    let engine = RadialLayoutEngine::new(options.layout.clone(), Colormap::resolve(&options.theme));
    let wedges = engine.layout(&ForestView {
        tree: &tree,
        usage: &usage,
    });
    let bounds = chart_bounds(&wedges, options.center);

    tracing::debug!(
        processes = snapshot.len(),
        roots = tree.roots().len(),
        wedges = wedges.len(),
        "chart laid out"
    );

    Chart {
        metric,
        snapshot,
        tree,
        usage,
        engine,
        center: options.center,
        wedges,
        bounds,
    }
}

/// Box around the centre and every wedge.
pub fn chart_bounds(wedges: &[Wedge], center: Point) -> Bounds {
    wedges
        .iter()
        .map(|w| w.bounds(center))
        .fold(Bounds::at(center), update_bounds)
}

impl Chart {
    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn title(&self) -> &'static str {
        self.metric.title()
    }

    pub fn theme(&self) -> &str {
        self.engine.colormap().name()
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn wedges(&self) -> &[Wedge] {
        &self.wedges
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn snapshot(&self) -> &ProcessSnapshot {
        &self.snapshot
    }

    pub fn tree(&self) -> &ProcessTree {
        &self.tree
    }

    pub fn usage(&self, pid: u32) -> f64 {
        self.usage.get(pid)
    }

    pub fn process(&self, pid: u32) -> Option<&ProcessRecord> {
        self.snapshot.get(pid)
    }

    pub fn wedge(&self, pid: u32) -> Option<&Wedge> {
        self.wedges.iter().find(|w| w.pid == pid)
    }

    /// Degrees covered by the innermost ring.
    pub fn total_span(&self) -> f64 {
        self.wedges
            .iter()
            .filter(|w| w.depth == 0)
            .map(Wedge::arc)
            .sum()
    }

    pub fn hit_tester(&self) -> HitTester<'_> {
        HitTester::new(&self.wedges).with_center(self.center)
    }

    pub fn find_wedge_at(&self, point: Point) -> Option<u32> {
        self.hit_tester().find_wedge_at(point)
    }

    /// Repaints every wedge with another theme, geometry untouched.
    pub fn recolor(&mut self, theme: &str) {
        self.engine = RadialLayoutEngine::new(self.engine.options().clone(), Colormap::resolve(theme));
        self.engine.recolor(&mut self.wedges);
    }

    pub fn describe(&self, pid: u32) -> Option<String> {
        self.process(pid).map(describe_process)
    }

    pub fn dump(&self) -> ChartDump<'_> {
        ChartDump {
            title: self.title(),
            metric: self.metric,
            theme: self.theme(),
            center: self.center,
            bounds: self.bounds,
            total_span: self.total_span(),
            wedges: self
                .wedges
                .iter()
                .map(|wedge| WedgeDump {
                    name: self.process(wedge.pid).map_or("", |p| p.name.as_str()),
                    usage: self.usage(wedge.pid),
                    wedge,
                })
                .collect(),
        }
    }
}

/// Serializable view handed to external renderers.
#[derive(Debug, Serialize)]
pub struct ChartDump<'a> {
    pub title: &'static str,
    pub metric: Metric,
    pub theme: &'a str,
    pub center: Point,
    pub bounds: Bounds,
    pub total_span: f64,
    pub wedges: Vec<WedgeDump<'a>>,
}

#[derive(Debug, Serialize)]
pub struct WedgeDump<'a> {
    pub name: &'a str,
    pub usage: f64,
    #[serde(flatten)]
    pub wedge: &'a Wedge,
}

fn two_decimals(reading: &Reading<f64>) -> String {
    match reading {
        Reading::Value(v) => format!("{v:.2}"),
        Reading::Denied => reading.to_string(),
    }
}

/// Tooltip text for one process.
pub fn describe_process(record: &ProcessRecord) -> String {
    let memory_usage = match &record.memory_bytes {
        Reading::Value(bytes) => format_bytes(*bytes),
        denied => denied.to_string(),
    };
    [
        format!("Name: {}", record.name),
        format!("PID: {}", record.pid),
        format!("CPU percent: {}", two_decimals(&record.cpu_percent)),
        format!("Memory percent: {}", two_decimals(&record.memory_percent)),
        format!("Memory usage: {memory_usage}"),
        format!("Owner: {}", record.username),
    ]
    .join("\n")
}
