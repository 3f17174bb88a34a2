//! Shared math for turning sky data into canvas coordinates and colors
//!
//! Pixel (0, 0) is drawn at the bottom-left of the canvas and pixel
//! centers sit at half-integer canvas positions.

use crate::config::Colormap;
use crate::domain::VertexPath;
use crate::wcs::SkyTransform;

/// Overlay stroke constants
pub mod stroke {
    /// Thinnest outline that still renders as a visible line
    pub const MIN_WIDTH: f32 = 0.25;
}

/// Piecewise-linear colormap channel: `(position, value)` control points
type Channel = &'static [(f32, f32)];

const BONE_RED: Channel = &[(0.0, 0.0), (0.746_032, 0.652_778), (1.0, 1.0)];
const BONE_GREEN: Channel = &[
    (0.0, 0.0),
    (0.365_079, 0.319_444),
    (0.746_032, 0.777_778),
    (1.0, 1.0),
];
const BONE_BLUE: Channel = &[(0.0, 0.0), (0.365_079, 0.444_444), (1.0, 1.0)];
const LINEAR: Channel = &[(0.0, 0.0), (1.0, 1.0)];

fn channels(colormap: Colormap) -> [Channel; 3] {
    match colormap {
        Colormap::Bone => [BONE_RED, BONE_GREEN, BONE_BLUE],
        Colormap::Gray => [LINEAR, LINEAR, LINEAR],
    }
}

fn interpolate(channel: Channel, t: f32) -> f32 {
    for pair in channel.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if t <= x1 {
            return y0 + (y1 - y0) * (t - x0) / (x1 - x0);
        }
    }
    channel.last().map_or(0.0, |&(_, y)| y)
}

/// Color for a normalized value in [0, 1]
pub fn colormap_rgb(colormap: Colormap, t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    channels(colormap).map(|channel| (interpolate(channel, t) * 255.0).round() as u8)
}

/// Linear stretch from the data range onto [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normalize {
    pub vmin: f32,
    pub vmax: f32,
}

impl Normalize {
    pub fn new(vmin: f32, vmax: f32) -> Self {
        Self { vmin, vmax }
    }

    /// `None` for values that should be drawn as missing data
    pub fn apply(&self, value: f32) -> Option<f32> {
        if !value.is_finite() {
            return None;
        }
        let span = self.vmax - self.vmin;
        if span <= 0.0 {
            return Some(0.0);
        }
        Some(((value - self.vmin) / span).clamp(0.0, 1.0))
    }
}

/// Canvas position of fractional image pixel `(x, y)`
#[inline]
pub fn image_to_canvas(x: f64, y: f64, image_height: usize, scale: f32) -> (f32, f32) {
    let cx = (x + 0.5) as f32 * scale;
    let cy = (image_height as f64 - (y + 0.5)) as f32 * scale;
    (cx, cy)
}

/// Project an outline into image pixels
///
/// Vertices the projection rejects break the outline. Returns the visible
/// runs and whether the single run wraps around into a closed outline.
pub fn project_outline(
    path: &VertexPath,
    transform: &dyn SkyTransform,
) -> (Vec<Vec<(f64, f64)>>, bool) {
    let projected: Vec<Option<(f64, f64)>> = path
        .into_iter()
        .map(|&(lon, lat)| {
            transform
                .sky_to_pixel(lon, lat)
                .filter(|(x, y)| x.is_finite() && y.is_finite())
        })
        .collect();

    let Some(first_gap) = projected.iter().position(Option::is_none) else {
        if projected.is_empty() {
            return (Vec::new(), false);
        }
        return (vec![projected.into_iter().flatten().collect()], true);
    };

    // Start right after a gap so no run straddles the end of the trace
    let n = projected.len();
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for i in 1..=n {
        match projected[(first_gap + i) % n] {
            Some(point) => current.push(point),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    (runs, false)
}
