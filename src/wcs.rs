//! World coordinate system of the sky image
//!
//! Maps celestial (longitude, latitude) onto image pixels using the
//! zenithal projections from `mapproj`. Only the keywords needed for a
//! plate-solved 2-D image are handled.

use std::f64::consts::PI;

use mapproj::{
    img2celestial::Img2Celestial,
    img2proj::WcsImgXY2ProjXY,
    zenithal::{arc::Arc, sin::Sin, stg::Stg, tan::Tan, zea::Zea},
    CanonicalProjection, CenteredProjection, ImgXY, LonLat,
};
use thiserror::Error;

/// Errors raised while setting up the projection
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WcsError {
    #[error("CTYPE1 '{0}' does not name a projection")]
    MalformedCtype(String),

    #[error("projection '{0}' is not supported (TAN, SIN, ARC, STG, ZEA are)")]
    UnsupportedProjection(String),

    #[error("degenerate pixel scale: {0}")]
    DegenerateScale(String),
}

/// Linear part of the pixel to intermediate-world mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinearTransform {
    /// `CDi_j` matrix
    Cd {
        cd11: f64,
        cd12: f64,
        cd21: f64,
        cd22: f64,
    },
    /// `CDELTi` scaling with a `PCi_j` matrix
    Pc {
        cdelt1: f64,
        cdelt2: f64,
        pc11: f64,
        pc12: f64,
        pc21: f64,
        pc22: f64,
    },
    /// `CDELTi` scaling with the legacy `CROTA2` rotation
    Crota { cdelt1: f64, cdelt2: f64, crota2: f64 },
}

impl LinearTransform {
    fn determinant(&self) -> f64 {
        match *self {
            LinearTransform::Cd {
                cd11,
                cd12,
                cd21,
                cd22,
            } => cd11 * cd22 - cd12 * cd21,
            LinearTransform::Pc {
                cdelt1,
                cdelt2,
                pc11,
                pc12,
                pc21,
                pc22,
            } => cdelt1 * cdelt2 * (pc11 * pc22 - pc12 * pc21),
            LinearTransform::Crota { cdelt1, cdelt2, .. } => cdelt1 * cdelt2,
        }
    }
}

/// WCS keywords of a celestial image
#[derive(Debug, Clone, PartialEq)]
pub struct WcsParams {
    pub ctype1: String,
    pub ctype2: String,
    /// Reference pixel, FITS 1-based
    pub crpix1: f64,
    pub crpix2: f64,
    /// Reference sky position in degrees
    pub crval1: f64,
    pub crval2: f64,
    pub linear: LinearTransform,
    /// Native longitude of the celestial pole in degrees
    pub lonpole: Option<f64>,
}

impl WcsParams {
    /// Three-letter projection code from `CTYPE1`, e.g. `TAN` in `RA---TAN`
    pub fn projection_code(&self) -> Result<&str, WcsError> {
        let ctype = self.ctype1.trim();
        ctype
            .get(5..8)
            .filter(|code| ctype.len() >= 8 && code.chars().all(|c| c.is_ascii_alphabetic()))
            .ok_or_else(|| WcsError::MalformedCtype(self.ctype1.clone()))
    }
}

/// Anything that places sky positions on the output image
///
/// Positions are in degrees; results are 0-based pixel coordinates of the
/// FITS array (x along NAXIS1, y along NAXIS2), or `None` when the
/// position cannot be projected.
pub trait SkyTransform {
    fn sky_to_pixel(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)>;
}

impl<F> SkyTransform for F
where
    F: Fn(f64, f64) -> Option<(f64, f64)>,
{
    fn sky_to_pixel(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        self(lon_deg, lat_deg)
    }
}

/// Celestial projection built from [`WcsParams`]
pub enum SkyProjection {
    Tan(Img2Celestial<Tan, WcsImgXY2ProjXY>),
    Sin(Img2Celestial<Sin, WcsImgXY2ProjXY>),
    Arc(Img2Celestial<Arc, WcsImgXY2ProjXY>),
    Stg(Img2Celestial<Stg, WcsImgXY2ProjXY>),
    Zea(Img2Celestial<Zea, WcsImgXY2ProjXY>),
}

impl std::fmt::Debug for SkyProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SkyProjection::{}", self.name())
    }
}

impl SkyProjection {
    pub fn new(params: &WcsParams) -> Result<Self, WcsError> {
        let det = params.linear.determinant();
        if !det.is_finite() || det == 0.0 {
            return Err(WcsError::DegenerateScale(format!("{:?}", params.linear)));
        }

        let img2proj = img_to_proj(params);
        let code = params.projection_code()?;
        log::debug!(
            "WCS {} at crval=({}, {}) crpix=({}, {})",
            code,
            params.crval1,
            params.crval2,
            params.crpix1,
            params.crpix2
        );

        let proj = match code {
            "TAN" => SkyProjection::Tan(Img2Celestial::new(img2proj, centered(Tan::new(), params))),
            "SIN" => SkyProjection::Sin(Img2Celestial::new(img2proj, centered(Sin::new(), params))),
            "ARC" => SkyProjection::Arc(Img2Celestial::new(img2proj, centered(Arc::new(), params))),
            "STG" => SkyProjection::Stg(Img2Celestial::new(img2proj, centered(Stg::new(), params))),
            "ZEA" => SkyProjection::Zea(Img2Celestial::new(img2proj, centered(Zea::new(), params))),
            other => return Err(WcsError::UnsupportedProjection(other.to_string())),
        };
        Ok(proj)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SkyProjection::Tan(_) => "TAN",
            SkyProjection::Sin(_) => "SIN",
            SkyProjection::Arc(_) => "ARC",
            SkyProjection::Stg(_) => "STG",
            SkyProjection::Zea(_) => "ZEA",
        }
    }

    /// Sky (degrees) to 0-based pixel coordinates
    pub fn proj_lonlat(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let lonlat = LonLat::new(lon_deg.to_radians(), lat_deg.to_radians());
        let img_xy = match self {
            SkyProjection::Tan(wcs) => wcs.lonlat2img(&lonlat),
            SkyProjection::Sin(wcs) => wcs.lonlat2img(&lonlat),
            SkyProjection::Arc(wcs) => wcs.lonlat2img(&lonlat),
            SkyProjection::Stg(wcs) => wcs.lonlat2img(&lonlat),
            SkyProjection::Zea(wcs) => wcs.lonlat2img(&lonlat),
        };
        img_xy.map(|xy| (xy.x() - 1.0, xy.y() - 1.0))
    }

    /// 0-based pixel coordinates to sky (degrees, longitude in [0, 360))
    pub fn unproj_lonlat(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let img_xy = ImgXY::new(x + 1.0, y + 1.0);
        let lonlat = match self {
            SkyProjection::Tan(wcs) => wcs.img2lonlat(&img_xy),
            SkyProjection::Sin(wcs) => wcs.img2lonlat(&img_xy),
            SkyProjection::Arc(wcs) => wcs.img2lonlat(&img_xy),
            SkyProjection::Stg(wcs) => wcs.img2lonlat(&img_xy),
            SkyProjection::Zea(wcs) => wcs.img2lonlat(&img_xy),
        }?;
        Some((
            lonlat.lon().to_degrees().rem_euclid(360.0),
            lonlat.lat().to_degrees(),
        ))
    }
}

impl SkyTransform for SkyProjection {
    fn sky_to_pixel(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        self.proj_lonlat(lon_deg, lat_deg)
    }
}

fn img_to_proj(params: &WcsParams) -> WcsImgXY2ProjXY {
    let (crpix1, crpix2) = (params.crpix1, params.crpix2);
    match params.linear {
        LinearTransform::Cd {
            cd11,
            cd12,
            cd21,
            cd22,
        } => WcsImgXY2ProjXY::from_cd(crpix1, crpix2, cd11, cd12, cd21, cd22),
        LinearTransform::Pc {
            cdelt1,
            cdelt2,
            pc11,
            pc12,
            pc21,
            pc22,
        } => WcsImgXY2ProjXY::from_pc(crpix1, crpix2, pc11, pc12, pc21, pc22, cdelt1, cdelt2),
        LinearTransform::Crota {
            cdelt1,
            cdelt2,
            crota2,
        } => WcsImgXY2ProjXY::from_cr(crpix1, crpix2, crota2, cdelt1, cdelt2),
    }
}

/// Center a zenithal projection on CRVAL, honouring LONPOLE
fn centered<P: CanonicalProjection>(proj: P, params: &WcsParams) -> CenteredProjection<P> {
    let crval = LonLat::new(params.crval1.to_radians(), params.crval2.to_radians());
    // Zenithal fiducial point is the native pole (theta_0 = 90 deg)
    let lonpole = params
        .lonpole
        .unwrap_or(if params.crval2 >= 90.0 { 0.0 } else { 180.0 });
    let positional_angle = PI - lonpole.to_radians();

    let mut centered = CenteredProjection::new(proj);
    centered.set_proj_center_from_lonlat_and_positional_angle(&crval, -positional_angle);
    centered
}
