use serde::Serialize;

/// The hierarchy the layout walks: ids, their children, and a usage
/// figure in percent of the whole system.
pub trait UsageForest {
    fn roots(&self) -> &[u32];
    fn children(&self, id: u32) -> &[u32];
    fn usage(&self, id: u32) -> f64;
}

/// Colour with every channel in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::opaque(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    pub fn lerp(self, target: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: self.r + (target.r - self.r) * t,
            g: self.g + (target.g - self.g) * t,
            b: self.b + (target.b - self.b) * t,
            a: self.a + (target.a - self.a) * t,
        }
    }

    pub fn scale_alpha(self, factor: f64) -> Self {
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_polar(center: Point, radius: f64, angle_degrees: f64) -> Self {
        let theta = angle_degrees.to_radians();
        Self {
            x: center.x + radius * theta.cos(),
            y: center.y + radius * theta.sin(),
        }
    }

    /// `(radius, angle)` relative to `center`, angle in `[0, 360)` degrees.
    pub fn to_polar(self, center: Point) -> (f64, f64) {
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        let mut angle = dy.atan2(dx).to_degrees();
        if angle < 0.0 {
            angle += 360.0;
        }
        (dx.hypot(dy), angle)
    }
}

/// Axis-aligned box, y growing upwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Bounds {
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn at(point: Point) -> Self {
        Self::new(point.y, point.x, point.y, point.x)
    }

    pub fn include(self, point: Point) -> Self {
        update_bounds(self, Self::at(point))
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

/// Smallest box containing both.
pub fn update_bounds(bounds: Bounds, other: Bounds) -> Bounds {
    Bounds {
        top: bounds.top.max(other.top),
        left: bounds.left.min(other.left),
        bottom: bounds.bottom.min(other.bottom),
        right: bounds.right.max(other.right),
    }
}

/// One process as a ring sector. Angles are degrees counter-clockwise
/// from the positive x axis and are not wrapped into a single turn.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Wedge {
    pub pid: u32,
    pub depth: usize,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub color: Rgba,
}

impl Wedge {
    pub fn arc(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    pub fn mid_angle(&self) -> f64 {
        (self.start_angle + self.end_angle) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.outer_radius - self.inner_radius
    }

    pub fn contains_polar(&self, radius: f64, angle_degrees: f64) -> bool {
        if !(self.inner_radius <= radius && radius <= self.outer_radius) {
            return false;
        }
        if !(self.start_angle.is_finite() && self.end_angle.is_finite()) {
            return false;
        }
        // Same direction as `angle_degrees`, on the first turn at or past
        // the wedge's unwrapped start.
        let angle = angle_degrees.rem_euclid(360.0);
        let turns = ((self.start_angle - angle) / 360.0).ceil();
        let unwrapped = angle + turns * 360.0;
        unwrapped >= self.start_angle && unwrapped <= self.end_angle
    }

    pub fn contains_point(&self, center: Point, point: Point) -> bool {
        let (radius, angle) = point.to_polar(center);
        self.contains_polar(radius, angle)
    }

    /// Middle of the band at the middle of the arc; where labels go.
    pub fn centroid(&self, center: Point) -> Point {
        let radius = (self.inner_radius + self.outer_radius) / 2.0;
        Point::from_polar(center, radius, self.mid_angle())
    }

    /// Extreme points of the outer arc: both ends plus every axis crossing.
    pub fn outline_points(&self, center: Point) -> Vec<Point> {
        let mut points = Vec::new();
        if !(self.start_angle.is_finite() && self.end_angle.is_finite()) {
            return points;
        }
        points.push(Point::from_polar(center, self.outer_radius, self.start_angle));
        let first = (self.start_angle / 90.0).ceil() as i64;
        let last = (self.end_angle / 90.0).floor() as i64;
        for quarter in first..=last {
            let angle = quarter as f64 * 90.0;
            points.push(Point::from_polar(center, self.outer_radius, angle));
        }
        points.push(Point::from_polar(center, self.outer_radius, self.end_angle));
        points
    }

    pub fn bounds(&self, center: Point) -> Bounds {
        self.outline_points(center)
            .into_iter()
            .fold(Bounds::at(center), Bounds::include)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wedge(inner: f64, outer: f64, start: f64, end: f64) -> Wedge {
        Wedge {
            pid: 1,
            depth: 0,
            inner_radius: inner,
            outer_radius: outer,
            start_angle: start,
            end_angle: end,
            color: Rgba::opaque(0.0, 0.0, 0.0),
        }
    }

    #[test]
    fn update_bounds_merges_extremes() {
        let merged = update_bounds(Bounds::new(0.0, 0.0, 0.0, 0.0), Bounds::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(merged, Bounds::new(1.0, 0.0, 0.0, 1.0));

        let merged = update_bounds(
            Bounds::new(0.0, 0.0, 1.0, 1.0),
            Bounds::new(5.0, -5.0, -5.0, 5.0),
        );
        assert_eq!(merged, Bounds::new(5.0, -5.0, -5.0, 5.0));
    }

    #[test]
    fn contains_polar_handles_band_and_span() {
        // Band [1, 2] from 90 to 180 degrees.
        let w = wedge(1.0, 2.0, 90.0, 180.0);
        assert!(w.contains_polar(1.1, 91.0));
        assert!(w.contains_polar(1.9, 179.0));
        assert!(!w.contains_polar(1.5, 45.0));
        assert!(!w.contains_polar(0.5, 120.0));
        assert!(!w.contains_polar(2.5, 120.0));
        assert!(w.contains_polar(1.5, -200.0));
    }

    #[test]
    fn contains_polar_past_full_turn() {
        let w = wedge(0.0, 1.0, 350.0, 370.0);
        assert!(w.contains_polar(0.5, 355.0));
        assert!(w.contains_polar(0.5, 5.0));
        assert!(!w.contains_polar(0.5, 15.0));
    }

    #[test]
    fn contains_polar_on_far_unwrapped_span() {
        let start = 360.0 * 1e7;
        let w = wedge(0.0, 1.0, start, start + 20.0);
        assert!(w.contains_polar(0.5, 10.0));
        assert!(!w.contains_polar(0.5, 30.0));
        assert!(wedge(0.0, 1.0, -10.0, 10.0).contains_polar(0.5, 355.0));
    }

    #[test]
    fn contains_polar_rejects_nan() {
        let w = wedge(0.0, 1.0, 0.0, 90.0);
        assert!(!w.contains_polar(f64::NAN, 10.0));
        assert!(!w.contains_polar(0.5, f64::NAN));
    }

    #[test]
    fn bounds_cover_axis_crossings() {
        let w = wedge(0.0, 1.0, 45.0, 135.0);
        let b = w.bounds(Point::new(0.0, 0.0));
        assert!((b.top - 1.0).abs() < 1e-12);
        assert!((b.bottom - 0.0).abs() < 1e-12);
        assert!((b.left + 45f64.to_radians().cos()).abs() < 1e-12);
        assert!((b.right - 45f64.to_radians().cos()).abs() < 1e-12);
    }

    #[test]
    fn centroid_sits_mid_band() {
        let w = wedge(0.1, 0.2, 0.0, 90.0);
        let c = w.centroid(Point::new(0.5, 0.5));
        let (radius, angle) = c.to_polar(Point::new(0.5, 0.5));
        assert!((radius - 0.15).abs() < 1e-12);
        assert!((angle - 45.0).abs() < 1e-9);
    }

    #[test]
    fn to_polar_normalizes_negative_angles() {
        let (radius, angle) = Point::new(0.0, -1.0).to_polar(Point::default());
        assert!((radius - 1.0).abs() < 1e-12);
        assert!((angle - 270.0).abs() < 1e-9);
    }
}
