//! Slit placement on the sky

use super::angle::{Angle, AngularPoint, IncompatibleUnits};

/// Where the slit was placed on the sky
#[derive(Clone, Debug, PartialEq)]
pub struct SlitPointing {
    /// RA in hours, DEC in degrees
    pub center: AngularPoint,
    /// East of north
    pub position_angle: Angle,
    pub object: String,
}

impl SlitPointing {
    /// Shift the center by pointing corrections, each on its own axis
    ///
    /// The RA correction is an on-sky offset along the RA axis as given,
    /// with no cos(dec) scaling.
    pub fn with_offsets(self, ra: Angle, dec: Angle) -> Result<Self, IncompatibleUnits> {
        Ok(Self {
            center: AngularPoint::new(self.center.lon.offset_by(ra)?, self.center.lat.offset_by(dec)?),
            ..self
        })
    }
}
