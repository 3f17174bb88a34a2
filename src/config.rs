//! Configuration for tdsplotslit
//!
//! Settings live in a JSON file, either passed with `--config` or found at
//! `<config dir>/tdsplotslit/config.json`. Every field is optional and
//! falls back to the defaults below.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::DEFAULT_RESOLUTION;

/// Largest accepted output upscale factor
pub const MAX_SCALE: u32 = 16;

/// Serializable color representation for config storage
///
/// Reads either `{ "r": .., "g": .., "b": .., "a": .. }` or a `#rrggbb`
/// string; always written as components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr")]
pub struct ShapeColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(String),
    Components {
        r: f32,
        g: f32,
        b: f32,
        #[serde(default = "default_alpha")]
        a: f32,
    },
}

fn default_alpha() -> f32 {
    1.0
}

impl TryFrom<ColorRepr> for ShapeColor {
    type Error = String;

    fn try_from(repr: ColorRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            ColorRepr::Hex(hex) => {
                ShapeColor::from_hex(&hex).ok_or_else(|| format!("invalid color '{}'", hex))
            }
            ColorRepr::Components { r, g, b, a } => Ok(ShapeColor { r, g, b, a }),
        }
    }
}

impl ShapeColor {
    pub const RED: ShapeColor = ShapeColor::rgb(1.0, 0.0, 0.0);
    /// Matplotlib's `tab:olive` (#bcbd22)
    pub const OLIVE: ShapeColor = ShapeColor::rgb(0.737_254_9, 0.741_176_5, 0.133_333_3);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().strip_prefix('#')?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .ok()
                .map(|v| v as f32 / 255.0)
        };
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 1.0 },
        })
    }

    /// Convert to image crate RGBA format (0-255)
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }
}

/// Colormap used to display the sky image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    #[default]
    Bone,
    Gray,
}

/// Size and look of one overlay quadrangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayStyle {
    /// Extent across the slit in arcseconds
    pub width_arcsec: f64,
    /// Extent along the slit in arcminutes
    pub height_arcmin: f64,
    /// Added to the position angle, in degrees
    pub rotation_offset_deg: f64,
    /// Outline color
    pub edge_color: ShapeColor,
    /// Interior color, `None` leaves the image visible
    pub fill_color: Option<ShapeColor>,
    /// Outline width in output pixels
    pub line_width: f32,
}

impl OverlayStyle {
    /// The slit itself: 1 arcsec x 3 arcmin, olive, thin
    pub fn slit() -> Self {
        Self {
            width_arcsec: 1.0,
            height_arcmin: 3.0,
            rotation_offset_deg: 0.0,
            edge_color: ShapeColor::OLIVE,
            fill_color: None,
            line_width: 0.5,
        }
    }

    /// Fiducial cross-bar, perpendicular to the slit
    pub fn fiducial() -> Self {
        Self {
            width_arcsec: 0.1,
            height_arcmin: 0.1,
            rotation_offset_deg: 90.0,
            edge_color: ShapeColor::RED,
            fill_color: None,
            line_width: 1.0,
        }
    }
}

/// Partial overlay settings as found in a config file
///
/// Missing fields keep the value of the overlay being patched, so a
/// fiducial entry that only sets a color stays a fiducial.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OverlayPatch {
    width_arcsec: Option<f64>,
    height_arcmin: Option<f64>,
    rotation_offset_deg: Option<f64>,
    edge_color: Option<ShapeColor>,
    fill_color: Option<ShapeColor>,
    line_width: Option<f32>,
}

impl OverlayPatch {
    fn apply(self, base: OverlayStyle) -> OverlayStyle {
        OverlayStyle {
            width_arcsec: self.width_arcsec.unwrap_or(base.width_arcsec),
            height_arcmin: self.height_arcmin.unwrap_or(base.height_arcmin),
            rotation_offset_deg: self.rotation_offset_deg.unwrap_or(base.rotation_offset_deg),
            edge_color: self.edge_color.unwrap_or(base.edge_color),
            fill_color: self.fill_color.or(base.fill_color),
            line_width: self.line_width.unwrap_or(base.line_width),
        }
    }
}

fn slit_style<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OverlayStyle, D::Error> {
    OverlayPatch::deserialize(deserializer).map(|patch| patch.apply(OverlayStyle::slit()))
}

fn fiducial_style<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OverlayStyle, D::Error> {
    OverlayPatch::deserialize(deserializer).map(|patch| patch.apply(OverlayStyle::fiducial()))
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Samples per quadrangle edge
    pub resolution: u32,
    /// Colormap for the sky image
    pub colormap: Colormap,
    /// Integer upscale factor of the output canvas
    pub scale: u32,
    /// Slit overlay
    #[serde(deserialize_with = "slit_style")]
    pub slit: OverlayStyle,
    /// Fiducial overlay
    #[serde(deserialize_with = "fiducial_style")]
    pub fiducial: OverlayStyle,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            colormap: Colormap::Bone,
            scale: 1,
            slit: OverlayStyle::slit(),
            fiducial: OverlayStyle::fiducial(),
        }
    }
}

impl PlotConfig {
    /// Directory and file name under the user config dir
    pub const APP_DIR: &'static str = "tdsplotslit";
    pub const FILE_NAME: &'static str = "config.json";

    /// Default location of the config file, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::APP_DIR).join(Self::FILE_NAME))
    }

    /// Load configuration
    ///
    /// An explicit path must exist and parse. The default location is
    /// optional: a missing file gives defaults, a broken one is logged and
    /// ignored.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let Some(path) = Self::default_path() else {
            log::debug!("No config directory on this platform, using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        match Self::from_file(&path) {
            Ok(config) => Ok(config),
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:#}", err);
                Ok(Self::default())
            }
        }
    }

    /// Read and parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: PlotConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            (1..=MAX_SCALE).contains(&self.scale),
            "scale must be between 1 and {}, got {}",
            MAX_SCALE,
            self.scale
        );
        Ok(())
    }

    /// Save configuration as pretty JSON
    #[cfg(test)]
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
