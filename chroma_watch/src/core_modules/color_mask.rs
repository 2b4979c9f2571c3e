// THEORY:
// The `color_mask` module turns an HSV frame into a binary mask for one color
// class. A pixel is set (255) when it falls inside the class, otherwise 0, the same
// encoding any thresholding tool produces. Wrapped classes are built as one mask
// per sub-range followed by a logical OR, so a pixel matching both halves is still
// set exactly once.

use crate::core_modules::color_range::{ColorClass, ColorRange};
use crate::core_modules::hsv_pixel::HsvFrame;
use image::{GrayImage, Luma};

pub const MASK_SET: u8 = 255;
pub const MASK_CLEAR: u8 = 0;

/// Selects the pixels of a single range.
pub fn range_mask(frame: &HsvFrame, range: &ColorRange) -> GrayImage {
    let (width, height) = frame.dimensions();
    let data = frame
        .pixels()
        .iter()
        .map(|&pixel| if range.contains(pixel) { MASK_SET } else { MASK_CLEAR })
        .collect();
    // The buffer length is width * height by construction.
    GrayImage::from_raw(width, height, data).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Logical OR of two equally sized masks.
pub fn union(mut accumulated: GrayImage, other: &GrayImage) -> GrayImage {
    for (target, source) in accumulated.pixels_mut().zip(other.pixels()) {
        if source[0] != MASK_CLEAR {
            *target = Luma([MASK_SET]);
        }
    }
    accumulated
}

/// Mask for a whole color class: one range as-is, two ranges unioned.
pub fn extract(frame: &HsvFrame, class: &ColorClass) -> GrayImage {
    let (width, height) = frame.dimensions();
    class
        .ranges
        .iter()
        .map(|range| range_mask(frame, range))
        .reduce(|accumulated, next| union(accumulated, &next))
        .unwrap_or_else(|| GrayImage::new(width, height))
}
