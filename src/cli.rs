//! Command line arguments

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Colormap, PlotConfig, MAX_SCALE};
use crate::domain::{Angle, Unit};

#[derive(Parser, Debug)]
#[command(
    name = "tdsplotslit",
    version,
    about = "Draw the spectrograph slit on a plate-solved sky image"
)]
pub struct Args {
    /// FITS image of the field with a celestial WCS
    pub image: PathBuf,

    /// FITS spectrum whose header holds RA, DEC and POSANG
    pub spectrum: PathBuf,

    /// Pointing correction added to RA
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub ra_corr: f64,

    /// Pointing correction added to DEC
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub dec_corr: f64,

    /// Unit of --ra-corr and --dec-corr
    #[arg(long, default_value = "arcsec")]
    pub corr_unit: Unit,

    /// Output PNG [default: <image>.slit.png]
    ///
    /// The object name is stored in the PNG Title metadata; no title text
    /// or RA/DEC axes are drawn on the image itself.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON config file [default: <config dir>/tdsplotslit/config.json]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Samples per quadrangle edge
    #[arg(long)]
    pub resolution: Option<u32>,

    /// Integer upscale factor of the output (1 to 16)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_SCALE)))]
    pub scale: Option<u32>,

    /// Colormap for the sky image
    #[arg(long, value_enum)]
    pub colormap: Option<Colormap>,
}

impl Args {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.image.with_extension("slit.png"))
    }

    /// RA and DEC corrections with their unit attached
    pub fn corrections(&self) -> (Angle, Angle) {
        (
            Angle::new(self.ra_corr, self.corr_unit),
            Angle::new(self.dec_corr, self.corr_unit),
        )
    }

    /// Command line settings take precedence over the config file
    pub fn apply_overrides(&self, config: &mut PlotConfig) {
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        if let Some(colormap) = self.colormap {
            config.colormap = colormap;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["tdsplotslit", "field.fits", "spec.fits"]).unwrap();
        assert_eq!(args.output_path(), PathBuf::from("field.slit.png"));
        assert_eq!(args.corrections(), (Angle::arcsec(0.0), Angle::arcsec(0.0)));

        let mut config = PlotConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config, PlotConfig::default());
    }

    #[test]
    fn test_negative_corrections_and_overrides() {
        let args = Args::try_parse_from([
            "tdsplotslit",
            "field.fits",
            "spec.fits",
            "--ra-corr",
            "-2.5",
            "--dec-corr",
            "1",
            "--corr-unit",
            "arcmin",
            "-o",
            "out.png",
            "--resolution",
            "8",
            "--colormap",
            "gray",
        ])
        .unwrap();

        assert_eq!(args.output_path(), PathBuf::from("out.png"));
        assert_eq!(args.corrections(), (Angle::arcmin(-2.5), Angle::arcmin(1.0)));

        let mut config = PlotConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.resolution, 8);
        assert_eq!(config.colormap, Colormap::Gray);
        assert_eq!(config.scale, 1);
    }

    #[test]
    fn test_rejects_unknown_unit() {
        let result = Args::try_parse_from([
            "tdsplotslit",
            "field.fits",
            "spec.fits",
            "--corr-unit",
            "furlong",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_scale_is_bounded() {
        let parse = |scale: &str| {
            Args::try_parse_from(["tdsplotslit", "field.fits", "spec.fits", "--scale", scale])
        };
        assert_eq!(parse("16").unwrap().scale, Some(16));
        assert!(parse("0").is_err());
        assert!(parse("17").is_err());
        assert!(parse("200000000").is_err());
    }

    #[test]
    fn test_output_help_mentions_title_metadata() {
        use clap::CommandFactory;

        let help = Args::command().render_long_help().to_string();
        assert!(help.contains("PNG Title metadata"), "{help}");
    }

    #[test]
    fn test_requires_both_inputs() {
        assert!(Args::try_parse_from(["tdsplotslit", "field.fits"]).is_err());
    }
}
