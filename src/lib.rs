//! Radial ("sunburst") view of how RAM or CPU is spread across the
//! process tree.
//!
//! The pipeline is `capture` -> `ProcessTree` -> `UsageAggregator` ->
//! `RadialLayoutEngine` -> wedges, which `HitTester` can then query.
//! `chart::build_chart` runs all of it; `worker::ChartWorker` runs it off
//! the caller's thread.

pub mod chart;
pub mod config;
pub mod format;
pub mod logging;
pub mod sunburst;
pub mod system;
pub mod worker;
