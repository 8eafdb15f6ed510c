use super::node::{Rgba, Wedge};

pub const DEFAULT_COLORMAP: &str = "spectral";

/// Alpha multiplier applied once per ring outward from the centre.
pub const ALPHA_FALLOFF: f64 = 0.8;

const fn f(r: f64, g: f64, b: f64) -> Rgba {
    Rgba::opaque(r, g, b)
}

const fn h(r: u8, g: u8, b: u8) -> Rgba {
    Rgba::from_rgb8(r, g, b)
}

const SPECTRAL: [Rgba; 21] = [
    f(0.0, 0.0, 0.0),
    f(0.4667, 0.0, 0.5333),
    f(0.5333, 0.0, 0.6),
    f(0.0, 0.0, 0.6667),
    f(0.0, 0.0, 0.8667),
    f(0.0, 0.4667, 0.8667),
    f(0.0, 0.6, 0.8667),
    f(0.0, 0.6667, 0.6667),
    f(0.0, 0.6667, 0.5333),
    f(0.0, 0.6, 0.0),
    f(0.0, 0.7333, 0.0),
    f(0.0, 0.8667, 0.0),
    f(0.0, 1.0, 0.0),
    f(0.7333, 1.0, 0.0),
    f(0.9333, 0.9333, 0.0),
    f(1.0, 0.8, 0.0),
    f(1.0, 0.6, 0.0),
    f(1.0, 0.0, 0.0),
    f(0.8667, 0.0, 0.0),
    f(0.8, 0.0, 0.0),
    f(0.8, 0.8, 0.8),
];

const VIRIDIS: [Rgba; 10] = [
    h(0x44, 0x01, 0x54),
    h(0x48, 0x28, 0x78),
    h(0x3e, 0x49, 0x89),
    h(0x31, 0x68, 0x8e),
    h(0x26, 0x82, 0x8e),
    h(0x1f, 0x9e, 0x89),
    h(0x35, 0xb7, 0x79),
    h(0x6e, 0xce, 0x58),
    h(0xb5, 0xde, 0x2b),
    h(0xfd, 0xe7, 0x25),
];

const PLASMA: [Rgba; 10] = [
    h(0x0d, 0x08, 0x87),
    h(0x46, 0x03, 0x9f),
    h(0x72, 0x01, 0xa8),
    h(0x9c, 0x17, 0x9e),
    h(0xbd, 0x37, 0x86),
    h(0xd8, 0x57, 0x6b),
    h(0xed, 0x79, 0x53),
    h(0xfb, 0x9f, 0x3a),
    h(0xfd, 0xca, 0x26),
    h(0xf0, 0xf9, 0x21),
];

const INFERNO: [Rgba; 10] = [
    h(0x00, 0x00, 0x04),
    h(0x1b, 0x0c, 0x41),
    h(0x4a, 0x0c, 0x6b),
    h(0x78, 0x1c, 0x6d),
    h(0xa5, 0x2c, 0x60),
    h(0xcf, 0x44, 0x46),
    h(0xed, 0x69, 0x25),
    h(0xfb, 0x9b, 0x06),
    h(0xf7, 0xd1, 0x3d),
    h(0xfc, 0xff, 0xa4),
];

const MAGMA: [Rgba; 10] = [
    h(0x00, 0x00, 0x04),
    h(0x18, 0x0f, 0x3d),
    h(0x44, 0x0f, 0x76),
    h(0x72, 0x1f, 0x81),
    h(0x9e, 0x2f, 0x7f),
    h(0xcd, 0x40, 0x71),
    h(0xf1, 0x60, 0x5d),
    h(0xfd, 0x96, 0x68),
    h(0xfe, 0xca, 0x8d),
    h(0xfc, 0xfd, 0xbf),
];

const COOLWARM: [Rgba; 7] = [
    h(0x3b, 0x4c, 0xc0),
    h(0x73, 0x96, 0xf5),
    h(0xb0, 0xcb, 0xfc),
    h(0xdd, 0xdc, 0xdc),
    h(0xf6, 0xbf, 0xa6),
    h(0xea, 0x7b, 0x60),
    h(0xb4, 0x04, 0x26),
];

const RAINBOW: [Rgba; 7] = [
    h(0x80, 0x00, 0xff),
    h(0x2c, 0x7e, 0xf7),
    h(0x2a, 0xdd, 0xdd),
    h(0x80, 0xff, 0xb4),
    h(0xd4, 0xdd, 0x80),
    h(0xff, 0x7e, 0x41),
    h(0xff, 0x00, 0x00),
];

const HSV: [Rgba; 7] = [
    f(1.0, 0.0, 0.0),
    f(1.0, 1.0, 0.0),
    f(0.0, 1.0, 0.0),
    f(0.0, 1.0, 1.0),
    f(0.0, 0.0, 1.0),
    f(1.0, 0.0, 1.0),
    f(1.0, 0.0, 0.0),
];

const JET: [Rgba; 9] = [
    f(0.0, 0.0, 0.5),
    f(0.0, 0.0, 1.0),
    f(0.0, 0.5, 1.0),
    f(0.0, 1.0, 1.0),
    f(0.5, 1.0, 0.5),
    f(1.0, 1.0, 0.0),
    f(1.0, 0.5, 0.0),
    f(1.0, 0.0, 0.0),
    f(0.5, 0.0, 0.0),
];

const GRAY: [Rgba; 2] = [f(0.0, 0.0, 0.0), f(1.0, 1.0, 1.0)];

static COLORMAPS: [(&str, &[Rgba]); 10] = [
    ("spectral", &SPECTRAL),
    ("viridis", &VIRIDIS),
    ("plasma", &PLASMA),
    ("inferno", &INFERNO),
    ("magma", &MAGMA),
    ("coolwarm", &COOLWARM),
    ("rainbow", &RAINBOW),
    ("hsv", &HSV),
    ("jet", &JET),
    ("gray", &GRAY),
];

/// A named continuous map from `[0, 1]` to a colour, built from evenly
/// spaced stops with linear interpolation between them.
#[derive(Clone, Debug, PartialEq)]
pub struct Colormap {
    name: String,
    stops: &'static [Rgba],
    reversed: bool,
}

impl Colormap {
    /// Case-insensitive; a `_r` suffix reverses the map.
    pub fn lookup(name: &str) -> Option<Self> {
        let wanted = name.trim().to_lowercase();
        let (base, reversed) = match wanted.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (wanted.as_str(), false),
        };
        let base = match base {
            "nipy_spectral" => "spectral",
            "grey" | "greys" | "grays" => "gray",
            other => other,
        };
        COLORMAPS
            .iter()
            .find(|(n, _)| *n == base)
            .map(|&(_, stops)| Colormap {
                name: wanted.clone(),
                stops,
                reversed,
            })
    }

    /// Like `lookup`, falling back to `spectral` for names it does not know.
    pub fn resolve(name: &str) -> Self {
        Self::lookup(name).unwrap_or_else(|| {
            tracing::warn!(theme = name, fallback = DEFAULT_COLORMAP, "unknown color theme");
            Self::default()
        })
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        COLORMAPS.iter().map(|(n, _)| *n)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample(&self, t: f64) -> Rgba {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let t = if self.reversed { 1.0 - t } else { t };

        let last = self.stops.len() - 1;
        if last == 0 {
            return self.stops[0];
        }
        let pos = t * last as f64;
        let index = (pos.floor() as usize).min(last - 1);
        self.stops[index].lerp(self.stops[index + 1], pos - index as f64)
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Colormap {
            name: DEFAULT_COLORMAP.to_string(),
            stops: &SPECTRAL,
            reversed: false,
        }
    }
}

/// Colour for a wedge centred at `mid_angle` degrees, `depth` rings out.
pub fn wedge_color(colormap: &Colormap, mid_angle: f64, depth: usize, alpha_falloff: f64) -> Rgba {
    let depth = i32::try_from(depth).unwrap_or(i32::MAX);
    colormap
        .sample(mid_angle / 360.0)
        .scale_alpha(alpha_falloff.powi(depth))
}

pub fn recolor(wedges: &mut [Wedge], colormap: &Colormap, alpha_falloff: f64) {
    for wedge in wedges.iter_mut() {
        wedge.color = wedge_color(colormap, wedge.mid_angle(), wedge.depth, alpha_falloff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgba, b: Rgba) -> bool {
        (a.r - b.r).abs() < 1e-9
            && (a.g - b.g).abs() < 1e-9
            && (a.b - b.b).abs() < 1e-9
            && (a.a - b.a).abs() < 1e-9
    }

    #[test]
    fn unknown_theme_falls_back_to_spectral() {
        let map = Colormap::resolve("no-such-theme");
        assert_eq!(map.name(), "spectral");
        assert!(close(map.sample(0.37), Colormap::default().sample(0.37)));
    }

    #[test]
    fn lookup_is_case_insensitive_and_supports_reversal() {
        let map = Colormap::lookup("Viridis").unwrap();
        let reversed = Colormap::lookup("viridis_r").unwrap();
        assert!(close(map.sample(0.2), reversed.sample(0.8)));
        assert!(Colormap::lookup("nope").is_none());
        assert!(Colormap::lookup("nipy_spectral").is_some());
    }

    #[test]
    fn sample_hits_stops_and_clamps() {
        let gray = Colormap::lookup("gray").unwrap();
        assert!(close(gray.sample(0.0), Rgba::opaque(0.0, 0.0, 0.0)));
        assert!(close(gray.sample(1.0), Rgba::opaque(1.0, 1.0, 1.0)));
        assert!(close(gray.sample(0.25), Rgba::opaque(0.25, 0.25, 0.25)));
        assert!(close(gray.sample(7.0), gray.sample(1.0)));
        assert!(close(gray.sample(-1.0), gray.sample(0.0)));
        assert!(close(gray.sample(f64::NAN), gray.sample(0.0)));
    }

    #[test]
    fn alpha_fades_per_ring() {
        let gray = Colormap::lookup("gray").unwrap();
        let root = wedge_color(&gray, 180.0, 0, ALPHA_FALLOFF);
        let deep = wedge_color(&gray, 180.0, 3, ALPHA_FALLOFF);
        assert!((root.a - 1.0).abs() < 1e-12);
        assert!((deep.a - 0.512).abs() < 1e-12);
        assert!((deep.r - 0.5).abs() < 1e-12);
    }

    #[test]
    fn every_named_map_resolves() {
        for name in Colormap::names() {
            let map = Colormap::lookup(name).expect(name);
            let c = map.sample(0.5);
            for channel in [c.r, c.g, c.b, c.a] {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }
}
