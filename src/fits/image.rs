//! Sky image with its world coordinate system

use std::path::Path;

use fitsio::hdu::{FitsHdu, HduInfo};
use fitsio::FitsFile;

use super::{read_key_optional, FitsError};
use crate::wcs::{LinearTransform, WcsParams};

/// A plate-solved sky image
#[derive(Clone, Debug)]
pub struct SkyImage {
    /// NAXIS1
    pub width: usize,
    /// NAXIS2
    pub height: usize,
    /// Row-major pixel values; row 0 is the first FITS row, which is
    /// displayed at the bottom
    pub pixels: Vec<f32>,
    /// WCS keywords of the primary HDU
    pub wcs: WcsParams,
}

impl SkyImage {
    /// Pixel value at column `x`, FITS row `y`
    pub fn value(&self, x: usize, y: usize) -> f32 {
        self.pixels[y * self.width + x]
    }

    /// Minimum and maximum over finite pixels
    pub fn finite_range(&self) -> Option<(f32, f32)> {
        self.pixels
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .fold(None, |range, p| match range {
                None => Some((p, p)),
                Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
            })
    }
}

/// Load the primary HDU of `path` as a sky image
///
/// BSCALE/BZERO are applied by cfitsio. A cube contributes its first plane.
pub fn load_sky_image(path: &Path) -> Result<SkyImage, FitsError> {
    let mut fptr = FitsFile::open(path).map_err(|source| FitsError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let hdu = fptr.primary_hdu().map_err(|source| FitsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    // Shape is in reverse NAXIS order: [NAXIS2, NAXIS1] or [NAXIS3, NAXIS2, NAXIS1]
    let shape = match &hdu.info {
        HduInfo::ImageInfo { shape, .. } => shape.clone(),
        _ => {
            return Err(FitsError::NotAnImage {
                path: path.to_path_buf(),
            })
        }
    };
    let (width, height) = match shape.as_slice() {
        [h, w] | [_, h, w] if *w > 0 && *h > 0 => (*w, *h),
        _ => {
            return Err(FitsError::UnsupportedShape {
                path: path.to_path_buf(),
                shape,
            })
        }
    };

    let mut pixels: Vec<f32> = hdu.read_image(&mut fptr).map_err(|source| FitsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let plane = width * height;
    if pixels.len() < plane {
        return Err(FitsError::UnsupportedShape {
            path: path.to_path_buf(),
            shape,
        });
    }
    pixels.truncate(plane);

    let wcs = read_wcs_params(&hdu, &mut fptr, path)?;
    log::debug!(
        "Sky image {}: {}x{} pixels, {}",
        path.display(),
        width,
        height,
        wcs.ctype1
    );

    Ok(SkyImage {
        width,
        height,
        pixels,
        wcs,
    })
}

/// Collect the WCS keywords of an image HDU
///
/// The linear part is taken from `CDi_j` when no `CDELTi` is present,
/// otherwise from `CDELTi` with `PCi_j` or `CROTA2`.
fn read_wcs_params(
    hdu: &FitsHdu,
    fptr: &mut FitsFile,
    path: &Path,
) -> Result<WcsParams, FitsError> {
    let mut required = |keyword: &'static str| -> Result<f64, FitsError> {
        read_key_optional::<f64>(hdu, fptr, keyword).ok_or_else(|| FitsError::MissingKeyword {
            path: path.to_path_buf(),
            keyword,
        })
    };
    let crpix1 = required("CRPIX1")?;
    let crpix2 = required("CRPIX2")?;
    let crval1 = required("CRVAL1")?;
    let crval2 = required("CRVAL2")?;

    let ctype1 = read_key_optional::<String>(hdu, fptr, "CTYPE1")
        .unwrap_or_else(|| "RA---TAN".to_string());
    let ctype2 = read_key_optional::<String>(hdu, fptr, "CTYPE2")
        .unwrap_or_else(|| "DEC--TAN".to_string());
    let lonpole = read_key_optional::<f64>(hdu, fptr, "LONPOLE");

    let linear = match read_key_optional::<f64>(hdu, fptr, "CDELT1") {
        Some(cdelt1) => {
            let cdelt2 = read_key_optional(hdu, fptr, "CDELT2").unwrap_or(cdelt1.abs());
            match read_key_optional::<f64>(hdu, fptr, "PC1_1") {
                Some(pc11) => LinearTransform::Pc {
                    cdelt1,
                    cdelt2,
                    pc11,
                    pc12: read_key_optional(hdu, fptr, "PC1_2").unwrap_or(0.0),
                    pc21: read_key_optional(hdu, fptr, "PC2_1").unwrap_or(0.0),
                    pc22: read_key_optional(hdu, fptr, "PC2_2").unwrap_or(1.0),
                },
                None => LinearTransform::Crota {
                    cdelt1,
                    cdelt2,
                    crota2: read_key_optional(hdu, fptr, "CROTA2").unwrap_or(0.0),
                },
            }
        }
        None => {
            let cd11 = read_key_optional::<f64>(hdu, fptr, "CD1_1").ok_or_else(|| {
                FitsError::MissingKeyword {
                    path: path.to_path_buf(),
                    keyword: "CD1_1",
                }
            })?;
            LinearTransform::Cd {
                cd11,
                cd12: read_key_optional(hdu, fptr, "CD1_2").unwrap_or(0.0),
                cd21: read_key_optional(hdu, fptr, "CD2_1").unwrap_or(0.0),
                cd22: read_key_optional(hdu, fptr, "CD2_2").unwrap_or(cd11.abs()),
            }
        }
    };

    Ok(WcsParams {
        ctype1,
        ctype2,
        crpix1,
        crpix2,
        crval1,
        crval2,
        linear,
        lonpole,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::testing::{write_sky_image, SkyFixture};

    #[test]
    fn test_load_sky_image_with_cd_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sky_image(dir.path(), &SkyFixture::default());

        let image = load_sky_image(&path).unwrap();
        assert_eq!(image.width, 40);
        assert_eq!(image.height, 30);
        assert_eq!(image.pixels.len(), 40 * 30);
        // Fixture value is x + 100 * y
        assert_eq!(image.value(3, 2), 203.0);
        assert_eq!(image.finite_range(), Some((0.0, 2939.0)));

        assert_eq!(image.wcs.ctype1, "RA---TAN");
        assert_eq!(image.wcs.crval1, 150.0);
        assert_eq!(image.wcs.crpix2, 15.5);
        assert!(matches!(image.wcs.linear, LinearTransform::Cd { .. }));
        assert_eq!(image.wcs.lonpole, None);
    }

    #[test]
    fn test_load_sky_image_with_cdelt() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = SkyFixture {
            use_cdelt: true,
            ..SkyFixture::default()
        };
        let path = write_sky_image(dir.path(), &fixture);

        let image = load_sky_image(&path).unwrap();
        match image.wcs.linear {
            LinearTransform::Crota {
                cdelt1,
                cdelt2,
                crota2,
            } => {
                // Header cards carry limited precision
                assert!((cdelt1 + fixture.scale_deg).abs() < 1e-12);
                assert!((cdelt2 - fixture.scale_deg).abs() < 1e-12);
                assert_eq!(crota2, 0.0);
            }
            other => panic!("unexpected linear transform {:?}", other),
        }
    }

    #[test]
    fn test_missing_wcs_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let fixture = SkyFixture {
            with_wcs: false,
            ..SkyFixture::default()
        };
        let path = write_sky_image(dir.path(), &fixture);

        let err = load_sky_image(&path).unwrap_err();
        assert!(matches!(err, FitsError::MissingKeyword { keyword: "CRPIX1", .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_sky_image(&dir.path().join("nope.fits")).unwrap_err();
        assert!(matches!(err, FitsError::Open { .. }));
        assert!(err.to_string().contains("nope.fits"));
    }
}
