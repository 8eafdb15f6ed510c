use std::cmp::Ordering;
use std::collections::HashSet;

use super::color::{ALPHA_FALLOFF, Colormap, recolor, wedge_color};
use super::node::{UsageForest, Wedge};

#[derive(Clone, Debug, PartialEq)]
pub struct LayoutOptions {
    /// Radial thickness of each ring.
    pub ring_width: f64,
    pub alpha_falloff: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            ring_width: 0.1,
            alpha_falloff: ALPHA_FALLOFF,
        }
    }
}

const FULL_TURN: f64 = 360.0;

/// Turns a usage forest into concentric rings of wedges.
///
/// Usage is read as percent of the whole system, so a process using 10%
/// spans 36 degrees. Nothing is stretched: if the roots only add up to
/// 40%, the wedges cover 144 degrees and the rest stays empty. Roots that
/// add up to more than 100% (shared pages counted once per process) are
/// cut off at a full turn, leaving the smallest ones zero-width.
#[derive(Clone, Debug)]
pub struct RadialLayoutEngine {
    options: LayoutOptions,
    colormap: Colormap,
}

struct Placement {
    id: u32,
    depth: usize,
    start: f64,
    end: f64,
}

impl RadialLayoutEngine {
    pub fn new(options: LayoutOptions, colormap: Colormap) -> Self {
        RadialLayoutEngine { options, colormap }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn colormap(&self) -> &Colormap {
        &self.colormap
    }

    /// Wedges in pre-order: each parent, then its children largest first.
    /// Zero-usage processes still get a zero-width wedge.
    pub fn layout<F: UsageForest + ?Sized>(&self, forest: &F) -> Vec<Wedge> {
        let mut wedges = Vec::new();
        let mut placed = HashSet::new();
        let mut stack = Vec::new();
        place_siblings(forest, forest.roots(), 0, 0.0, Some(FULL_TURN), &mut stack);

        while let Some(p) = stack.pop() {
            if !placed.insert(p.id) {
                tracing::debug!(pid = p.id, "skipping process already laid out");
                continue;
            }
            let depth = p.depth as f64;
            wedges.push(Wedge {
                pid: p.id,
                depth: p.depth,
                inner_radius: self.options.ring_width * depth,
                outer_radius: self.options.ring_width * (depth + 1.0),
                start_angle: p.start,
                end_angle: p.end,
                color: wedge_color(
                    &self.colormap,
                    (p.start + p.end) / 2.0,
                    p.depth,
                    self.options.alpha_falloff,
                ),
            });
            place_siblings(
                forest,
                forest.children(p.id),
                p.depth + 1,
                p.start,
                Some(p.end),
                &mut stack,
            );
        }

        wedges
    }

    pub fn recolor(&self, wedges: &mut [Wedge]) {
        recolor(wedges, &self.colormap, self.options.alpha_falloff);
    }
}

/// Degrees of a full turn a usage percentage is worth.
pub fn span_degrees(usage: f64) -> f64 {
    if usage.is_finite() && usage > 0.0 {
        usage / 100.0 * 360.0
    } else {
        0.0
    }
}

/// Orders siblings by descending usage (pid ascending on ties), lays them
/// end to end from `start`, and pushes them so the largest pops first.
/// Children never run past their parent's `limit`.
fn place_siblings<F: UsageForest + ?Sized>(
    forest: &F,
    ids: &[u32],
    depth: usize,
    start: f64,
    limit: Option<f64>,
    stack: &mut Vec<Placement>,
) {
    if ids.is_empty() {
        return;
    }

    let mut ordered: Vec<(u32, f64)> = ids.iter().map(|&id| (id, forest.usage(id))).collect();
    ordered.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });

    let mut cursor = start;
    let mut placements = Vec::with_capacity(ordered.len());
    for (id, usage) in ordered {
        let mut end = cursor + span_degrees(usage);
        if let Some(limit) = limit {
            end = end.min(limit).max(cursor);
        }
        placements.push(Placement {
            id,
            depth,
            start: cursor,
            end,
        });
        cursor = end;
    }

    stack.extend(placements.into_iter().rev());
}
