// THEORY:
// Raw color masks are speckled: sensor noise and compression artifacts light up
// isolated pixels everywhere. The `morphology` module cleans a mask with an
// opening, i.e. an erosion followed by a dilation, using a disk-shaped structuring
// element.
//
// - Erosion keeps a pixel only if every kernel position over it is set, which
//   deletes anything smaller than the disk.
// - Dilation sets a pixel if any kernel position over it is set, which grows the
//   surviving blobs back to roughly their original extent.
//
// Kernel positions that fall outside the image are ignored. At the border an
// erosion therefore only looks at in-bounds neighbors and never eats a blob just
// because it touches the edge.

use crate::core_modules::color_mask::{MASK_CLEAR, MASK_SET};
use image::GrayImage;

/// A disk of radius `r` inscribed in a `(2r + 1) x (2r + 1)` box, stored as
/// offsets from the anchor at its center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    radius: u32,
    offsets: Vec<(i32, i32)>,
}

impl StructuringElement {
    /// Row by row, each row spans `round(sqrt(r^2 - dy^2))` pixels either side of
    /// the center column.
    pub fn disk(radius: u32) -> Self {
        let r = radius as i32;
        let mut offsets = Vec::new();
        for dy in -r..=r {
            let half_width = (((r * r - dy * dy) as f64).sqrt()).round() as i32;
            for dx in -half_width..=half_width {
                offsets.push((dx, dy));
            }
        }
        Self { radius, offsets }
    }

    /// Side length of the bounding box.
    pub fn size(&self) -> u32 {
        2 * self.radius + 1
    }

    pub fn offsets(&self) -> &[(i32, i32)] {
        &self.offsets
    }

    pub fn contains(&self, dx: i32, dy: i32) -> bool {
        self.offsets.contains(&(dx, dy))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Erode,
    Dilate,
}

fn apply(mask: &GrayImage, element: &StructuringElement, operation: Operation) -> GrayImage {
    let (width, height) = mask.dimensions();
    let (width_i, height_i) = (width as i32, height as i32);
    let mut output = GrayImage::new(width, height);

    for y in 0..height_i {
        for x in 0..width_i {
            let mut in_bounds = element.offsets().iter().filter_map(|&(dx, dy)| {
                let nx = x + dx;
                let ny = y + dy;
                if nx >= 0 && nx < width_i && ny >= 0 && ny < height_i {
                    Some(mask.get_pixel(nx as u32, ny as u32)[0] != MASK_CLEAR)
                } else {
                    None
                }
            });
            let set = match operation {
                Operation::Erode => in_bounds.all(|is_set| is_set),
                Operation::Dilate => in_bounds.any(|is_set| is_set),
            };
            if set {
                output.put_pixel(x as u32, y as u32, image::Luma([MASK_SET]));
            }
        }
    }

    output
}

pub fn erode(mask: &GrayImage, element: &StructuringElement) -> GrayImage {
    apply(mask, element, Operation::Erode)
}

pub fn dilate(mask: &GrayImage, element: &StructuringElement) -> GrayImage {
    apply(mask, element, Operation::Dilate)
}

/// Erode-then-dilate filter with independently sized kernels. A radius of zero
/// skips that step entirely.
#[derive(Debug, Clone)]
pub struct MorphologicalFilter {
    erode_element: Option<StructuringElement>,
    dilate_element: Option<StructuringElement>,
}

impl MorphologicalFilter {
    pub fn new(erode_radius: u32, dilate_radius: u32) -> Self {
        Self {
            erode_element: (erode_radius > 0).then(|| StructuringElement::disk(erode_radius)),
            dilate_element: (dilate_radius > 0).then(|| StructuringElement::disk(dilate_radius)),
        }
    }

    pub fn apply(&self, mask: &GrayImage) -> GrayImage {
        let eroded = match &self.erode_element {
            Some(element) => erode(mask, element),
            None => mask.clone(),
        };
        match &self.dilate_element {
            Some(element) => dilate(&eroded, element),
            None => eroded,
        }
    }
}
