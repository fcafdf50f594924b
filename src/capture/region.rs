//! Percentage regions → pixel rectangles → owned sub-images.
//!
//! Each edge is floored independently: `floor(pct / 100 * dimension)`.
//! A region's pixel height can therefore differ by one from what the
//! percentages imply. Existing profiles were tuned against this formula,
//! keep it.

use crate::error::ExtractError;
use crate::profiles::Region;
use image::DynamicImage;

/// Pixel rectangle inside a concrete image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

fn floor_edge(percent: f64, dimension: u32) -> i64 {
    (percent / 100.0 * dimension as f64).floor() as i64
}

/// Convert a percentage region to pixels for an image of `width`×`height`.
///
/// Fails with `DegenerateRegion` when the floored rectangle is empty or
/// falls outside the image.
pub fn pixel_bounds(region: &Region, width: u32, height: u32) -> Result<PixelRect, ExtractError> {
    let y1 = floor_edge(region.y_start, height);
    let y2 = floor_edge(region.y_end, height);
    let x1 = floor_edge(region.x_start, width);
    let x2 = floor_edge(region.x_end, width);

    let degenerate = || ExtractError::DegenerateRegion {
        region: *region,
        width,
        height,
    };

    if x1 < 0 || y1 < 0 || x2 > width as i64 || y2 > height as i64 {
        return Err(degenerate());
    }
    if x2 <= x1 || y2 <= y1 {
        return Err(degenerate());
    }

    Ok(PixelRect {
        x: x1 as u32,
        y: y1 as u32,
        width: (x2 - x1) as u32,
        height: (y2 - y1) as u32,
    })
}

/// Crop `region` out of `image` into a new, independently owned raster.
pub fn crop(image: &DynamicImage, region: &Region) -> Result<DynamicImage, ExtractError> {
    let rect = pixel_bounds(region, image.width(), image.height())?;
    log::debug!(
        "[CAPTURE] Crop {{x: {}, y: {}, w: {}, h: {}}} from {}x{}",
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        image.width(),
        image.height()
    );
    Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
}

/// Encode a raster to PNG bytes in memory.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut png_bytes = Vec::new();
    image.write_to(
        &mut std::io::Cursor::new(&mut png_bytes),
        image::ImageFormat::Png,
    )?;
    Ok(png_bytes)
}
