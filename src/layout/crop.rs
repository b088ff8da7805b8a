// Pad-and-crop of detected regions
use crate::types::{BBox, Page, Region};
use image::{imageops, RgbImage};

pub const PAD_HORIZONTAL: f32 = 15.0;
pub const PAD_VERTICAL: f32 = 5.0;

/// Integer pixel rectangle, always inside the page it was clamped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct CroppedSegment {
    pub page: usize,
    pub order: Option<usize>,
    pub rect: PixelRect,
    pub image: RgbImage,
}

/// Padded box clamped to `[0, width) x [0, height)`; never empty.
pub fn padded_rect(bbox: &BBox, width: u32, height: u32) -> PixelRect {
    let max_x = width.saturating_sub(1) as f32;
    let max_y = height.saturating_sub(1) as f32;

    let x0 = (bbox.x0 - PAD_HORIZONTAL).floor().clamp(0.0, max_x) as u32;
    let y0 = (bbox.y0 - PAD_VERTICAL).floor().clamp(0.0, max_y) as u32;
    // exclusive right/bottom edges
    let x1 = ((bbox.x1 + PAD_HORIZONTAL).ceil().clamp(0.0, width as f32) as u32).max(x0 + 1);
    let y1 = ((bbox.y1 + PAD_VERTICAL).ceil().clamp(0.0, height as f32) as u32).max(y0 + 1);

    PixelRect {
        x: x0,
        y: y0,
        width: x1.min(width.max(1)) - x0,
        height: y1.min(height.max(1)) - y0,
    }
}

pub fn crop(region: &Region, page: &Page) -> CroppedSegment {
    let rect = padded_rect(&region.bbox, page.width(), page.height());
    let image = imageops::crop_imm(&page.image, rect.x, rect.y, rect.width, rect.height).to_image();
    CroppedSegment {
        page: region.page,
        order: region.order,
        rect,
        image,
    }
}
