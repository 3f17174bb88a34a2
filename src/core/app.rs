use anyhow::{Context, Result};

use crate::cli::Args;
use crate::config::PlotConfig;
use crate::domain::{build_slit_overlays, SlitPointing, Unit};
use crate::fits::{load_sky_image, read_slit_pointing, SkyImage};
use crate::render::export::save_png;
use crate::render::image::{draw_overlays_on_image, render_sky_image};
use crate::wcs::SkyProjection;

/// Plot the slit of `args.spectrum` over `args.image` and save it as PNG
pub(crate) fn run(args: &Args) -> Result<()> {
    let mut config = PlotConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    let pointing = read_slit_pointing(&args.spectrum)?;
    let (ra_corr, dec_corr) = args.corrections();
    let pointing = pointing
        .with_offsets(ra_corr, dec_corr)
        .context("Invalid pointing correction")?;

    // Geometry errors abort before anything is rendered
    let overlays =
        build_slit_overlays(&pointing, &config).context("Failed to build slit outline")?;

    let sky = load_sky_image(&args.image)?;
    let projection = SkyProjection::new(&sky.wcs)
        .with_context(|| format!("Unusable WCS in {}", args.image.display()))?;
    log::info!(
        "Loaded {}x{} image with {} projection",
        sky.width,
        sky.height,
        projection.name()
    );
    let (mid_x, mid_y) = ((sky.width as f64 - 1.0) / 2.0, (sky.height as f64 - 1.0) / 2.0);
    if let Some((lon, lat)) = projection.unproj_lonlat(mid_x, mid_y) {
        log::debug!("Image center at ({:.6}, {:.6}) deg", lon, lat);
    }
    warn_if_off_image(&sky, &projection, &pointing)?;

    let mut canvas = render_sky_image(&sky, config.colormap, config.scale)?;
    draw_overlays_on_image(
        &mut canvas,
        &overlays,
        &projection,
        sky.height,
        config.scale as f32,
    );

    let output = args.output_path();
    save_png(&output, &canvas, Some(pointing.object.as_str()))?;
    Ok(())
}

fn warn_if_off_image(
    sky: &SkyImage,
    projection: &SkyProjection,
    pointing: &SlitPointing,
) -> Result<()> {
    let (lon, lat) = pointing.center.to_value(Unit::Degree)?;
    match projection.proj_lonlat(lon, lat) {
        Some((x, y))
            if (-0.5..sky.width as f64 - 0.5).contains(&x)
                && (-0.5..sky.height as f64 - 0.5).contains(&y) =>
        {
            log::debug!("Slit center at pixel ({:.2}, {:.2})", x, y);
        }
        Some((x, y)) => log::warn!(
            "Slit center ({:.6}, {:.6}) falls outside the image at pixel ({:.1}, {:.1})",
            lon,
            lat,
            x,
            y
        ),
        None => log::warn!(
            "Slit center ({:.6}, {:.6}) cannot be projected onto the image",
            lon,
            lat
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::testing::{write_sky_image, write_spectrum, SkyFixture, SpectrumFixture};
    use clap::Parser;
    use std::path::Path;

    fn write_inputs(dir: &Path, posang: Option<f64>) {
        write_sky_image(dir, &SkyFixture::default());
        write_spectrum(
            dir,
            "spec.fits",
            &SpectrumFixture {
                ra: Some("10:00:00"),
                dec: Some("+02:00:00"),
                posang,
                object: Some("NGC 3115"),
                ..Default::default()
            },
        );
    }

    fn args(dir: &Path, extra: &[&str]) -> Args {
        let config = dir.join("config.json");
        PlotConfig::default().save(&config).unwrap();
        let mut argv = vec![
            "tdsplotslit".to_string(),
            dir.join("sky.fits").display().to_string(),
            dir.join("spec.fits").display().to_string(),
            "-c".to_string(),
            config.display().to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_run_draws_slit_over_image() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), Some(0.0));
        let args = args(dir.path(), &[]);

        run(&args).unwrap();

        let output = dir.path().join("sky.slit.png");
        let plot = image::open(&output).unwrap().to_rgba8();
        assert_eq!(plot.dimensions(), (40, 30));

        let sky = load_sky_image(&dir.path().join("sky.fits")).unwrap();
        let plain = render_sky_image(&sky, PlotConfig::default().colormap, 1).unwrap();
        // Slit and fiducial stay within the center columns
        let changed: Vec<u32> = (0..40)
            .filter(|&x| (0..30).any(|y| plot.get_pixel(x, y) != plain.get_pixel(x, y)))
            .collect();
        assert!(!changed.is_empty());
        assert!(changed.iter().all(|x| (16..=23).contains(x)), "{changed:?}");
    }

    #[test]
    fn test_run_writes_object_title() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), Some(30.0));
        let output = dir.path().join("plot.png");
        let args = args(dir.path(), &["-o", output.to_str().unwrap(), "--scale", "2"]);

        run(&args).unwrap();

        let file = std::io::BufReader::new(std::fs::File::open(&output).unwrap());
        let reader = png::Decoder::new(file).read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (80, 60));
        assert_eq!(png_title(&output).as_deref(), Some("NGC 3115"));
        assert!(info.uncompressed_latin1_text.is_empty());
    }

    fn png_title(path: &Path) -> Option<String> {
        let file = std::io::BufReader::new(std::fs::File::open(path).unwrap());
        let reader = png::Decoder::new(file).read_info().unwrap();
        reader
            .info()
            .utf8_text
            .iter()
            .find(|chunk| chunk.keyword == "Title")
            .map(|chunk| chunk.get_text().unwrap())
    }

    #[test]
    fn test_non_latin1_file_stem_becomes_title() {
        let dir = tempfile::tempdir().unwrap();
        write_sky_image(dir.path(), &SkyFixture::default());
        write_spectrum(
            dir.path(),
            "ω_cen.fits",
            &SpectrumFixture {
                ra: Some("10:00:00"),
                dec: Some("+02:00:00"),
                posang: Some(0.0),
                ..Default::default()
            },
        );
        let config = dir.path().join("config.json");
        PlotConfig::default().save(&config).unwrap();
        let args = Args::try_parse_from([
            "tdsplotslit".to_string(),
            dir.path().join("sky.fits").display().to_string(),
            dir.path().join("ω_cen.fits").display().to_string(),
            "-c".to_string(),
            config.display().to_string(),
        ])
        .unwrap();

        run(&args).unwrap();

        let output = dir.path().join("sky.slit.png");
        assert_eq!(png_title(&output).as_deref(), Some("ω_cen"));
    }

    #[test]
    fn test_oversized_scale_in_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), Some(0.0));
        let args = args(dir.path(), &[]);
        std::fs::write(dir.path().join("config.json"), r#"{ "scale": 200000000 }"#).unwrap();

        let err = run(&args).unwrap_err();
        assert!(format!("{err:#}").contains("scale must be between"));
        assert!(!dir.path().join("sky.slit.png").exists());
    }

    #[test]
    fn test_invalid_geometry_aborts_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), Some(0.0));
        let args = args(dir.path(), &["--resolution", "0"]);

        let err = run(&args).unwrap_err();
        assert!(format!("{err:#}").contains("resolution"));
        assert!(!dir.path().join("sky.slit.png").exists());
    }

    #[test]
    fn test_missing_posang_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path(), None);
        let args = args(dir.path(), &[]);

        let err = run(&args).unwrap_err();
        assert!(format!("{err:#}").contains("POSANG"));
        assert!(!dir.path().join("sky.slit.png").exists());
    }
}
