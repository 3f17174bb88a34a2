//! PNG output

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;

/// Encode `image` as 8-bit RGBA PNG, with an optional UTF-8 `Title` chunk
pub fn write_png<W: io::Write>(
    w: W,
    image: &RgbaImage,
    title: Option<&str>,
) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(w, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    if let Some(title) = title {
        encoder.add_itxt_chunk("Title".to_string(), title.to_string())?;
    }
    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())
}

/// Write `image` to `path` as PNG
///
/// The file is only created once encoding has succeeded.
pub fn save_png(path: &Path, image: &RgbaImage, title: Option<&str>) -> Result<()> {
    let mut bytes = Vec::new();
    write_png(&mut bytes, image, title)
        .with_context(|| format!("Failed to encode PNG: {}", path.display()))?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    log::info!(
        "Saved {}x{} plot to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}
