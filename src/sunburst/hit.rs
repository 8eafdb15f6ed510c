use super::node::{Point, Wedge};

/// Point-in-wedge lookup over a laid-out chart.
///
/// Wedges are tried innermost ring first, then by start angle, so a point
/// sitting exactly on a shared edge always resolves the same way.
pub struct HitTester<'a> {
    wedges: &'a [Wedge],
    order: Vec<usize>,
    center: Point,
}

impl<'a> HitTester<'a> {
    pub fn new(wedges: &'a [Wedge]) -> Self {
        let mut order: Vec<usize> = (0..wedges.len()).collect();
        order.sort_by(|&a, &b| {
            let (wa, wb) = (&wedges[a], &wedges[b]);
            wa.depth
                .cmp(&wb.depth)
                .then(wa.start_angle.total_cmp(&wb.start_angle))
                .then(wa.end_angle.total_cmp(&wb.end_angle))
                .then(wa.pid.cmp(&wb.pid))
        });
        HitTester {
            wedges,
            order,
            center: Point::default(),
        }
    }

    pub fn with_center(mut self, center: Point) -> Self {
        self.center = center;
        self
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn wedge_at(&self, point: Point) -> Option<&'a Wedge> {
        let (radius, angle) = point.to_polar(self.center);
        self.wedge_at_polar(radius, angle)
    }

    pub fn wedge_at_polar(&self, radius: f64, angle_degrees: f64) -> Option<&'a Wedge> {
        let wedges = self.wedges;
        self.order
            .iter()
            .map(|&i| &wedges[i])
            .find(|w| w.contains_polar(radius, angle_degrees))
    }

    pub fn find_wedge_at(&self, point: Point) -> Option<u32> {
        self.wedge_at(point).map(|w| w.pid)
    }
}
