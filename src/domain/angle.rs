//! Angular quantities and sky positions
//!
//! Angles carry their unit so that widths given in arcseconds and centers
//! given in degrees can be mixed freely and converted once, at the point
//! where geometry is built.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Unit attached to an [`Angle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    Degree,
    Radian,
    Arcminute,
    Arcsecond,
    /// Hours of right ascension (15 degrees each)
    HourAngle,
    /// Image-plane length; has no angular equivalent without a plate scale
    Pixel,
}

impl Unit {
    /// Size of one unit in degrees, or `None` for non-angular units
    pub fn degrees_per_unit(self) -> Option<f64> {
        match self {
            Unit::Degree => Some(1.0),
            Unit::Radian => Some(180.0 / std::f64::consts::PI),
            Unit::Arcminute => Some(1.0 / 60.0),
            Unit::Arcsecond => Some(1.0 / 3600.0),
            Unit::HourAngle => Some(15.0),
            Unit::Pixel => None,
        }
    }

    /// Short symbol used in log and error messages
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Degree => "deg",
            Unit::Radian => "rad",
            Unit::Arcminute => "arcmin",
            Unit::Arcsecond => "arcsec",
            Unit::HourAngle => "hourangle",
            Unit::Pixel => "pix",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deg" | "degree" | "degrees" => Ok(Unit::Degree),
            "rad" | "radian" | "radians" => Ok(Unit::Radian),
            "arcmin" | "arcminute" | "arcminutes" => Ok(Unit::Arcminute),
            "arcsec" | "arcsecond" | "arcseconds" => Ok(Unit::Arcsecond),
            "h" | "hour" | "hours" | "hourangle" => Ok(Unit::HourAngle),
            "pix" | "pixel" | "pixels" => Ok(Unit::Pixel),
            other => Err(format!("unknown unit '{}'", other)),
        }
    }
}

/// Returned when a quantity cannot be expressed in the requested unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot convert {from} to {to}")]
pub struct IncompatibleUnits {
    pub from: Unit,
    pub to: Unit,
}

/// A value paired with its unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angle {
    pub value: f64,
    pub unit: Unit,
}

impl Angle {
    pub const fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub const fn degrees(value: f64) -> Self {
        Self::new(value, Unit::Degree)
    }

    pub const fn arcmin(value: f64) -> Self {
        Self::new(value, Unit::Arcminute)
    }

    pub const fn arcsec(value: f64) -> Self {
        Self::new(value, Unit::Arcsecond)
    }

    pub const fn hours(value: f64) -> Self {
        Self::new(value, Unit::HourAngle)
    }

    /// Express this angle in `unit`
    pub fn to_value(self, unit: Unit) -> Result<f64, IncompatibleUnits> {
        if self.unit == unit {
            return Ok(self.value);
        }
        let incompatible = IncompatibleUnits {
            from: self.unit,
            to: unit,
        };
        let from = self.unit.degrees_per_unit().ok_or(incompatible)?;
        let to = unit.degrees_per_unit().ok_or(incompatible)?;
        Ok(self.value * from / to)
    }

    /// Convert to radians, failing for non-angular units
    pub fn to_radians(self) -> Result<f64, IncompatibleUnits> {
        self.to_value(Unit::Radian)
    }

    /// Sum of two angles, expressed in the unit of `self`
    pub fn offset_by(self, other: Angle) -> Result<Angle, IncompatibleUnits> {
        Ok(Angle::new(self.value + other.to_value(self.unit)?, self.unit))
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// A (longitude, latitude) pair on the sky
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularPoint {
    pub lon: Angle,
    pub lat: Angle,
}

impl AngularPoint {
    pub const fn new(lon: Angle, lat: Angle) -> Self {
        Self { lon, lat }
    }

    #[cfg(test)]
    pub const fn degrees(lon: f64, lat: f64) -> Self {
        Self::new(Angle::degrees(lon), Angle::degrees(lat))
    }

    /// Both components expressed in `unit`
    pub fn to_value(self, unit: Unit) -> Result<(f64, f64), IncompatibleUnits> {
        Ok((self.lon.to_value(unit)?, self.lat.to_value(unit)?))
    }
}

/// Parse a sexagesimal or decimal angle string into its leading unit
///
/// Accepts `12:34:56.7`, `12 34 56.7`, `12h34m56.7s`, `-05d06m07s` and
/// plain decimals. A leading sign applies to the whole value.
pub fn parse_sexagesimal(s: &str) -> Option<f64> {
    let s = s.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let parts: Vec<f64> = body
        .split([' ', ':', 'h', 'd', 'm', 's', '\''])
        .filter(|p| !p.is_empty())
        .map(|p| p.trim().parse().ok())
        .collect::<Option<Vec<_>>>()?;

    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    if parts.iter().any(|p| !p.is_finite() || p.is_sign_negative()) {
        return None;
    }

    let value = parts
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(part, div)| part / div)
        .sum::<f64>();

    Some(if negative { -value } else { value })
}
