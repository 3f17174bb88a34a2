//! Slit pointing from the spectrum header

use std::path::Path;

use fitsio::hdu::FitsHdu;
use fitsio::FitsFile;

use super::{read_key_optional, FitsError};
use crate::domain::angle::{parse_sexagesimal, Angle, AngularPoint};
use crate::domain::pointing::SlitPointing;

/// Read RA, DEC, POSANG and OBJECT from the primary header of `path`
///
/// RA is hours and DEC degrees, either sexagesimal strings or numbers.
/// OBJECT falls back to the file stem.
pub fn read_slit_pointing(path: &Path) -> Result<SlitPointing, FitsError> {
    let mut fptr = FitsFile::open(path).map_err(|source| FitsError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let hdu = fptr.primary_hdu().map_err(|source| FitsError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let ra = read_angle_key(&hdu, &mut fptr, path, "RA")?;
    let dec = read_angle_key(&hdu, &mut fptr, path, "DEC")?;
    let posang = read_angle_key(&hdu, &mut fptr, path, "POSANG")?;
    let object = read_key_optional::<String>(&hdu, &mut fptr, "OBJECT")
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    log::info!(
        "Slit pointing for {}: RA {}h DEC {}deg PA {}deg",
        object,
        ra,
        dec,
        posang
    );

    Ok(SlitPointing {
        center: AngularPoint::new(Angle::hours(ra), Angle::degrees(dec)),
        position_angle: Angle::degrees(posang),
        object,
    })
}

/// Read a keyword holding a sexagesimal string or a plain number
fn read_angle_key(
    hdu: &FitsHdu,
    fptr: &mut FitsFile,
    path: &Path,
    keyword: &'static str,
) -> Result<f64, FitsError> {
    // cfitsio hands unquoted numbers back as their literal text
    if let Some(text) = read_key_optional::<String>(hdu, fptr, keyword) {
        return parse_sexagesimal(&text)
            .filter(|v| v.is_finite())
            .ok_or_else(|| FitsError::InvalidKeyword {
                path: path.to_path_buf(),
                keyword,
                value: text,
            });
    }
    read_key_optional::<f64>(hdu, fptr, keyword).ok_or_else(|| FitsError::MissingKeyword {
        path: path.to_path_buf(),
        keyword,
    })
}
