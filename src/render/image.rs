//! Image rendering using tiny-skia
//!
//! The sky image is colormapped into an RgbaImage and the overlay outlines
//! are stroked on top of it.

use image::{Rgba, RgbaImage};
use thiserror::Error;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::geometry::{self, stroke, Normalize};
use crate::config::{Colormap, MAX_SCALE};
use crate::domain::SlitOverlay;
use crate::fits::SkyImage;
use crate::wcs::SkyTransform;

/// Convert RgbaImage to Pixmap, apply drawing function, and copy back
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) {
    let (w, h) = (img.width(), img.height());
    let Some(size) = tiny_skia::IntSize::from_wh(w, h) else {
        return;
    };
    let Some(mut pixmap) = Pixmap::from_vec(img.as_raw().clone(), size) else {
        return;
    };

    f(&mut pixmap);

    img.copy_from_slice(pixmap.data());
}

/// 1 GiB of RGBA
const MAX_CANVAS_PIXELS: u64 = 1 << 28;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{width}x{height} image cannot be scaled by {scale}")]
    CanvasTooLarge {
        width: usize,
        height: usize,
        scale: u32,
    },
}

/// Canvas dimensions for an image upscaled by `scale`
fn canvas_size(width: usize, height: usize, scale: u32) -> Result<(u32, u32), RenderError> {
    let too_large = || RenderError::CanvasTooLarge {
        width,
        height,
        scale,
    };
    if !(1..=MAX_SCALE).contains(&scale) {
        return Err(too_large());
    }
    let scaled = |n: usize| u32::try_from(n).ok().and_then(|n| n.checked_mul(scale));
    match (scaled(width), scaled(height)) {
        (Some(w), Some(h)) if u64::from(w) * u64::from(h) <= MAX_CANVAS_PIXELS => Ok((w, h)),
        _ => Err(too_large()),
    }
}

/// Colormap the sky image onto a canvas `scale` times its size
///
/// FITS row 0 ends up at the bottom. Non-finite pixels stay transparent.
pub fn render_sky_image(
    sky: &SkyImage,
    colormap: Colormap,
    scale: u32,
) -> Result<RgbaImage, RenderError> {
    let (width, height) = canvas_size(sky.width, sky.height, scale)?;
    let norm = match sky.finite_range() {
        Some((vmin, vmax)) => Normalize::new(vmin, vmax),
        None => {
            log::warn!("Sky image has no finite pixels");
            Normalize::new(0.0, 0.0)
        }
    };
    log::debug!("Display range [{}, {}]", norm.vmin, norm.vmax);

    Ok(RgbaImage::from_fn(width, height, |cx, cy| {
        let x = (cx / scale) as usize;
        let y = sky.height - 1 - (cy / scale) as usize;
        match norm.apply(sky.value(x, y)) {
            Some(t) => {
                let [r, g, b] = geometry::colormap_rgb(colormap, t);
                Rgba([r, g, b, 255])
            }
            None => Rgba([0, 0, 0, 0]),
        }
    }))
}

/// Build a path from projected runs in canvas coordinates
fn build_outline_path(
    runs: &[Vec<(f64, f64)>],
    closed: bool,
    image_height: usize,
    scale: f32,
) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for run in runs {
        let mut points = run
            .iter()
            .map(|&(x, y)| geometry::image_to_canvas(x, y, image_height, scale));
        let Some((x0, y0)) = points.next() else {
            continue;
        };
        pb.move_to(x0, y0);
        for (x, y) in points {
            pb.line_to(x, y);
        }
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

/// Draw overlays onto a canvas produced by [`render_sky_image`]
///
/// `transform` maps overlay vertices onto pixels of an image
/// `image_height` rows tall; `scale` must match the canvas upscale.
pub fn draw_overlays_on_image(
    img: &mut RgbaImage,
    overlays: &[SlitOverlay],
    transform: &dyn SkyTransform,
    image_height: usize,
    scale: f32,
) {
    if overlays.is_empty() {
        return;
    }

    with_pixmap(img, |pixmap| {
        for overlay in overlays {
            let (runs, closed) = geometry::project_outline(&overlay.path, transform);
            if runs.is_empty() {
                log::warn!(
                    "{} outline cannot be projected onto the image",
                    overlay.kind.label()
                );
                continue;
            }
            if !closed {
                log::debug!(
                    "{} outline split into {} pieces",
                    overlay.kind.label(),
                    runs.len()
                );
            }
            let Some(path) = build_outline_path(&runs, closed, image_height, scale) else {
                continue;
            };

            // Fill first so the edge stays on top
            if closed && let Some(fill) = overlay.style.fill_color {
                let [r, g, b, a] = fill.to_rgba_u8();
                let mut paint = Paint::default();
                paint.set_color_rgba8(r, g, b, a);
                paint.anti_alias = true;
                pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }

            let [r, g, b, a] = overlay.style.edge_color.to_rgba_u8();
            let mut paint = Paint::default();
            paint.set_color_rgba8(r, g, b, a);
            paint.anti_alias = true;

            let stroke = Stroke {
                width: (overlay.style.line_width * scale).max(stroke::MIN_WIDTH),
                line_cap: LineCap::Butt,
                line_join: LineJoin::Miter,
                ..Default::default()
            };
            // stroke_path drops coverage at collinear joins; fill the outline instead
            let Some(outline) = path.stroke(&stroke, 1.0) else {
                continue;
            };
            pixmap.fill_path(&outline, &paint, FillRule::Winding, Transform::identity(), None);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OverlayStyle, ShapeColor};
    use crate::domain::{build_quadrangle, Angle, AngularPoint, OverlayKind, QuadrangleSpec};
    use crate::wcs::{LinearTransform, WcsParams};

    fn sky(width: usize, height: usize, pixels: Vec<f32>) -> SkyImage {
        SkyImage {
            width,
            height,
            pixels,
            wcs: WcsParams {
                ctype1: "RA---TAN".into(),
                ctype2: "DEC--TAN".into(),
                crpix1: 1.0,
                crpix2: 1.0,
                crval1: 0.0,
                crval2: 0.0,
                linear: LinearTransform::Cd {
                    cd11: -1.0,
                    cd12: 0.0,
                    cd21: 0.0,
                    cd22: 1.0,
                },
                lonpole: None,
            },
        }
    }

    #[test]
    fn test_render_sky_image_lower_origin_and_scale() {
        // Row 0 is [0, 1], row 1 is [2, 3]
        let image = sky(2, 2, vec![0.0, 1.0, 2.0, 3.0]);
        let canvas = render_sky_image(&image, Colormap::Gray, 2).unwrap();

        assert_eq!(canvas.dimensions(), (4, 4));
        // Top-left of the canvas shows row 1
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([170, 170, 170, 255]));
        assert_eq!(canvas.get_pixel(1, 1), &Rgba([170, 170, 170, 255]));
        // Bottom-left shows row 0, the minimum
        assert_eq!(canvas.get_pixel(0, 3), &Rgba([0, 0, 0, 255]));
        // Bottom-right shows row 0, column 1
        assert_eq!(canvas.get_pixel(3, 3), &Rgba([85, 85, 85, 255]));
        assert_eq!(canvas.get_pixel(3, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_non_finite_pixels_are_transparent() {
        let image = sky(2, 1, vec![f32::NAN, 5.0]);
        let canvas = render_sky_image(&image, Colormap::Bone, 1).unwrap();
        assert_eq!(canvas.get_pixel(0, 0)[3], 0);
        assert_eq!(canvas.get_pixel(1, 0)[3], 255);
    }

    #[test]
    fn test_oversized_scale_is_rejected() {
        let image = sky(40, 30, vec![0.0; 1200]);
        for scale in [0, MAX_SCALE + 1, 200_000_000] {
            let err = render_sky_image(&image, Colormap::Bone, scale).unwrap_err();
            assert!(matches!(err, RenderError::CanvasTooLarge { .. }), "{scale}");
        }
        assert!(render_sky_image(&image, Colormap::Bone, MAX_SCALE).is_ok());

        // Within the factor bound but too many pixels
        assert!(canvas_size(usize::MAX, 1, 1).is_err());
        assert!(canvas_size(20_000, 20_000, 1).is_err());
    }

    fn box_overlay(fill: Option<ShapeColor>) -> SlitOverlay {
        // 10x10 box centred on pixel (10, 10); identity transform below
        let spec = QuadrangleSpec::new(AngularPoint::degrees(10.0, 10.0))
            .with_size(Angle::degrees(10.0), Angle::degrees(10.0))
            .with_resolution(4);
        let mut style = OverlayStyle::slit();
        style.edge_color = ShapeColor::RED;
        style.fill_color = fill;
        style.line_width = 1.0;
        SlitOverlay {
            kind: OverlayKind::Slit,
            path: build_quadrangle(&spec).unwrap(),
            style,
        }
    }

    fn black_canvas() -> RgbaImage {
        RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn test_draw_overlay_outline() {
        let mut canvas = black_canvas();
        let identity = |x: f64, y: f64| Some((x, y));
        draw_overlays_on_image(&mut canvas, &[box_overlay(None)], &identity, 20, 1.0);

        // Left edge sits at image x = 5, canvas x = 5.5
        assert!(canvas.get_pixel(5, 9)[0] > 200);
        assert_eq!(canvas.get_pixel(5, 9)[1], 0);
        // Interior untouched without a fill
        assert_eq!(canvas.get_pixel(10, 10), &Rgba([0, 0, 0, 255]));
        // Outside untouched
        assert_eq!(canvas.get_pixel(1, 1), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_outline_coverage_is_uniform_along_edge() {
        let mut canvas = black_canvas();
        let identity = |x: f64, y: f64| Some((x, y));
        draw_overlays_on_image(&mut canvas, &[box_overlay(None)], &identity, 20, 1.0);

        // Rows 5..=13 span the left edge, including the interior samples
        let column: Vec<u8> = (5..=13).map(|y| canvas.get_pixel(5, y)[0]).collect();
        assert!(column.iter().all(|&r| r >= 250), "{column:?}");
        let row: Vec<u8> = (6..=14).map(|x| canvas.get_pixel(x, 14)[0]).collect();
        assert!(row.iter().all(|&r| r >= 250), "{row:?}");
    }

    #[test]
    fn test_draw_overlay_fill() {
        let mut canvas = black_canvas();
        let identity = |x: f64, y: f64| Some((x, y));
        let fill = ShapeColor::rgb(0.0, 0.0, 1.0);
        draw_overlays_on_image(&mut canvas, &[box_overlay(Some(fill))], &identity, 20, 1.0);

        assert_eq!(canvas.get_pixel(10, 10), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_unprojectable_overlay_is_skipped() {
        let mut canvas = black_canvas();
        let reject = |_: f64, _: f64| -> Option<(f64, f64)> { None };
        draw_overlays_on_image(&mut canvas, &[box_overlay(None)], &reject, 20, 1.0);

        assert!(canvas.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }
}
