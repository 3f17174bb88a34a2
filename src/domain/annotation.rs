//! Overlay shapes drawn on the sky image
//!
//! Vertices are stored in degrees of (RA, DEC) and only mapped to image
//! pixels at render time.

use super::angle::{Angle, Unit};
use super::geometry::{build_quadrangle, QuadrangleError, QuadrangleSpec, VertexPath};
use super::pointing::SlitPointing;
use crate::config::{OverlayStyle, PlotConfig};

/// Which outline an overlay represents
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    /// The spectrograph slit aperture
    Slit,
    /// Small orientation marker perpendicular to the slit
    Fiducial,
}

impl OverlayKind {
    pub fn label(self) -> &'static str {
        match self {
            OverlayKind::Slit => "slit",
            OverlayKind::Fiducial => "fiducial",
        }
    }
}

/// A quadrangle outline with its drawing style
#[derive(Clone, Debug, PartialEq)]
pub struct SlitOverlay {
    pub kind: OverlayKind,
    pub path: VertexPath,
    pub style: OverlayStyle,
}

/// Build one overlay centred on the slit pointing
pub fn build_overlay(
    kind: OverlayKind,
    pointing: &SlitPointing,
    style: &OverlayStyle,
    resolution: u32,
) -> Result<SlitOverlay, QuadrangleError> {
    let rotation = pointing
        .position_angle
        .offset_by(Angle::degrees(style.rotation_offset_deg))
        .map_err(|_| QuadrangleError::UnitConversion {
            name: "rotation",
            value: pointing.position_angle,
            target: Unit::Degree,
        })?;
    let spec = QuadrangleSpec::new(pointing.center)
        .with_size(
            Angle::arcsec(style.width_arcsec),
            Angle::arcmin(style.height_arcmin),
        )
        .with_rotation(rotation)
        .with_resolution(resolution)
        .with_vertex_unit(Unit::Degree);

    let path = build_quadrangle(&spec)?;
    log::debug!(
        "Built {} outline with {} vertices, rotation {}",
        kind.label(),
        path.len(),
        rotation
    );

    Ok(SlitOverlay {
        kind,
        path,
        style: *style,
    })
}

/// Slit and fiducial overlays, in drawing order
pub fn build_slit_overlays(
    pointing: &SlitPointing,
    config: &PlotConfig,
) -> Result<Vec<SlitOverlay>, QuadrangleError> {
    Ok(vec![
        build_overlay(OverlayKind::Slit, pointing, &config.slit, config.resolution)?,
        build_overlay(
            OverlayKind::Fiducial,
            pointing,
            &config.fiducial,
            config.resolution,
        )?,
    ])
}
