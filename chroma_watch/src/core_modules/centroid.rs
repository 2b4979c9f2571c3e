// THEORY:
// The `centroid` module reduces a filtered mask to a single location: the center
// of mass of all set pixels. The mask is treated as binary (any non-zero pixel
// weighs 1), so the zeroth moment is the pixel count and the first moments are the
// sums of the x and y coordinates. An empty mask has no center; that is reported
// as `None` and is a normal outcome, not an error.

use crate::core_modules::color_mask::MASK_CLEAR;
use image::GrayImage;

/// An integer pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in pixels.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = (self.x - other.x) as f64;
        let dy = (self.y - other.y) as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Raw spatial moments of a binary mask, up to first order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl Moments {
    pub fn of(mask: &GrayImage) -> Self {
        let mut count: u64 = 0;
        let mut sum_x: u64 = 0;
        let mut sum_y: u64 = 0;
        for (x, y, pixel) in mask.enumerate_pixels() {
            if pixel[0] != MASK_CLEAR {
                count += 1;
                sum_x += x as u64;
                sum_y += y as u64;
            }
        }
        Self {
            m00: count as f64,
            m10: sum_x as f64,
            m01: sum_y as f64,
        }
    }

    /// `(m10 / m00, m01 / m00)` truncated toward zero, or `None` for an empty mask.
    pub fn centroid(&self) -> Option<Point> {
        if self.m00 <= 0.0 {
            return None;
        }
        Some(Point::new(
            (self.m10 / self.m00) as i32,
            (self.m01 / self.m00) as i32,
        ))
    }
}

pub fn locate(mask: &GrayImage) -> Option<Point> {
    Moments::of(mask).centroid()
}
