//! Slit quadrangle geometry
//!
//! Builds the outline of a rectangle in (longitude, latitude) space,
//! sampled densely along every edge and rotated about its center. The
//! dense sampling lets a non-linear sky projection bend the edges when the
//! outline is later mapped onto an image.

use thiserror::Error;

use super::angle::{Angle, AngularPoint, IncompatibleUnits, Unit};

/// Default number of samples per edge
pub const DEFAULT_RESOLUTION: u32 = 100;

/// Errors raised while building a quadrangle
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuadrangleError {
    #[error("invalid {name}: {value} must be a positive, finite angle")]
    InvalidDimension { name: &'static str, value: Angle },

    #[error("invalid resolution {0}: at least one sample per edge is required")]
    InvalidResolution(u32),

    #[error("cannot express {name} ({value}) in {target}")]
    UnitConversion {
        name: &'static str,
        value: Angle,
        target: Unit,
    },

    #[error("center {0} has a non-finite component")]
    NonFiniteCenter(String),
}

/// Full description of one quadrangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadrangleSpec {
    /// Center of the rectangle
    pub center: AngularPoint,
    /// Extent along longitude, before rotation
    pub width: Angle,
    /// Extent along latitude, before rotation
    pub height: Angle,
    /// Rotation about the center
    pub rotation: Angle,
    /// Samples per edge
    pub resolution: u32,
    /// Unit of the produced vertices
    pub vertex_unit: Unit,
}

impl QuadrangleSpec {
    /// A spec with the slit defaults (1.5 arcsec x 3 arcmin, unrotated)
    pub fn new(center: AngularPoint) -> Self {
        Self {
            center,
            width: Angle::arcsec(1.5),
            height: Angle::arcmin(3.0),
            rotation: Angle::degrees(0.0),
            resolution: DEFAULT_RESOLUTION,
            vertex_unit: Unit::Degree,
        }
    }

    pub fn with_size(mut self, width: Angle, height: Angle) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_rotation(mut self, rotation: Angle) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_vertex_unit(mut self, unit: Unit) -> Self {
        self.vertex_unit = unit;
        self
    }
}

/// Closed outline of a quadrangle, in the spec's vertex unit
///
/// The last vertex connects back to the first; the first vertex is not
/// repeated at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexPath {
    vertices: Vec<(f64, f64)>,
    unit: Unit,
}

impl VertexPath {
    pub fn vertices(&self) -> &[(f64, f64)] {
        &self.vertices
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Arithmetic mean of the vertices
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.vertices.is_empty() {
            return None;
        }
        let n = self.vertices.len() as f64;
        let (sx, sy) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        Some((sx / n, sy / n))
    }
}

impl<'a> IntoIterator for &'a VertexPath {
    type Item = &'a (f64, f64);
    type IntoIter = std::slice::Iter<'a, (f64, f64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.vertices.iter()
    }
}

/// Build the rotated outline described by `spec`
pub fn build_quadrangle(spec: &QuadrangleSpec) -> Result<VertexPath, QuadrangleError> {
    if spec.resolution < 1 {
        return Err(QuadrangleError::InvalidResolution(spec.resolution));
    }
    let unit = spec.vertex_unit;
    let convert = |name: &'static str, value: Angle| {
        value
            .to_value(unit)
            .map_err(|_: IncompatibleUnits| QuadrangleError::UnitConversion {
                name,
                value,
                target: unit,
            })
    };

    let lon_c = convert("center longitude", spec.center.lon)?;
    let lat_c = convert("center latitude", spec.center.lat)?;
    if !lon_c.is_finite() || !lat_c.is_finite() {
        return Err(QuadrangleError::NonFiniteCenter(format!(
            "({}, {})",
            spec.center.lon, spec.center.lat
        )));
    }

    let width = convert("width", spec.width)?;
    if !(width.is_finite() && width > 0.0) {
        return Err(QuadrangleError::InvalidDimension {
            name: "width",
            value: spec.width,
        });
    }
    let height = convert("height", spec.height)?;
    if !(height.is_finite() && height > 0.0) {
        return Err(QuadrangleError::InvalidDimension {
            name: "height",
            value: spec.height,
        });
    }

    let theta = spec
        .rotation
        .to_radians()
        .map_err(|_| QuadrangleError::UnitConversion {
            name: "rotation",
            value: spec.rotation,
            target: Unit::Radian,
        })?;

    let n = spec.resolution as usize;
    let lon0 = lon_c - width * 0.5;
    let lat0 = lat_c - height * 0.5;
    let lon_seq = linspace(lon0, width, n);
    let lat_seq = linspace(lat0, height, n);

    let mut vertices = Vec::with_capacity(4 * n);
    // Bottom edge, left to right
    vertices.extend(lon_seq[..n].iter().map(|&lon| (lon, lat_seq[0])));
    // Right edge, bottom to top
    vertices.extend(lat_seq[..n].iter().map(|&lat| (lon_seq[n], lat)));
    // Top edge, right to left
    vertices.extend(lon_seq[1..].iter().rev().map(|&lon| (lon, lat_seq[n])));
    // Left edge, top to bottom
    vertices.extend(lat_seq[1..].iter().rev().map(|&lat| (lon_seq[0], lat)));

    let center = (lon_c, lat_c);
    for v in vertices.iter_mut() {
        *v = rotate_about(*v, center, theta);
    }

    log::debug!(
        "Built quadrangle at ({:.6}, {:.6}) {}: {}x{} {}, theta={:.4} rad, {} vertices",
        lon_c,
        lat_c,
        unit,
        width,
        height,
        unit,
        theta,
        vertices.len()
    );

    Ok(VertexPath { vertices, unit })
}

/// `n + 1` evenly spaced samples over `[start, start + span]`
fn linspace(start: f64, span: f64, n: usize) -> Vec<f64> {
    (0..=n)
        .map(|i| {
            if i == n {
                start + span
            } else {
                start + span * (i as f64 / n as f64)
            }
        })
        .collect()
}

/// Rotate `v` about `center` with `R = [[cos, sin], [-sin, cos]]`
///
/// This is the transpose of the usual counter-clockwise matrix, i.e. a
/// standard rotation by `-theta`. Slit position angles are laid out with
/// this convention and it must not be flipped.
#[inline]
pub fn rotate_about(v: (f64, f64), center: (f64, f64), theta: f64) -> (f64, f64) {
    let (sin, cos) = theta.sin_cos();
    let dx = v.0 - center.0;
    let dy = v.1 - center.1;
    (
        cos * dx + sin * dy + center.0,
        -sin * dx + cos * dy + center.1,
    )
}
