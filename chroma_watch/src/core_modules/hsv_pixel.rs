// THEORY:
// The `hsv_pixel` module is the lowest layer of the engine. It converts a single
// RGB pixel into the 8-bit hue/saturation/value triple that every color range in
// the system is expressed in. Like the `Pixel` container it grew out of, it has
// single-pixel scope: nothing here reads neighbors or history.
//
// The 8-bit encoding follows the convention used by common camera tooling:
// - hue is degrees halved, so the full circle fits in 0..=179
// - saturation is chroma / value, scaled to 0..=255
// - value is the brightest channel, 0..=255
// Ranges authored against that convention can therefore be used unchanged.

use image::{Rgb, RgbImage};

pub type Channel = u8;

/// The largest hue the 8-bit encoding can produce (359 degrees, halved).
pub const MAX_HUE: Channel = 179;

/// A single pixel in 8-bit HSV space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hsv {
    pub hue: Channel,
    pub saturation: Channel,
    pub value: Channel,
}

impl Hsv {
    pub fn new(hue: Channel, saturation: Channel, value: Channel) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    /// Converts one RGB pixel to 8-bit HSV.
    pub fn from_rgb(red: Channel, green: Channel, blue: Channel) -> Self {
        let red_f = red as f32;
        let green_f = green as f32;
        let blue_f = blue as f32;

        let maximum_channel = red_f.max(green_f.max(blue_f));
        let minimum_channel = red_f.min(green_f.min(blue_f));
        let chroma = maximum_channel - minimum_channel;

        let saturation = if maximum_channel > 0.0 {
            (255.0 * chroma / maximum_channel).round()
        } else {
            0.0
        };

        if chroma <= 0.0 {
            return Self::new(0, saturation as Channel, maximum_channel as Channel);
        }

        let (base_difference, sector_offset) = if maximum_channel == red_f {
            (green_f - blue_f, 0.0)
        } else if maximum_channel == green_f {
            (blue_f - red_f, 120.0)
        } else {
            (red_f - green_f, 240.0)
        };

        let mut hue_degrees = 60.0 * base_difference / chroma + sector_offset;
        if hue_degrees < 0.0 {
            hue_degrees += 360.0;
        }

        // 359.x degrees rounds up to 180, which is the same angle as 0.
        let mut hue = (hue_degrees / 2.0).round() as u16;
        if hue > MAX_HUE as u16 {
            hue = 0;
        }

        Self::new(hue as Channel, saturation as Channel, maximum_channel as Channel)
    }
}

impl From<&Rgb<u8>> for Hsv {
    fn from(pixel: &Rgb<u8>) -> Self {
        Hsv::from_rgb(pixel[0], pixel[1], pixel[2])
    }
}

/// A whole frame converted to HSV, stored row-major.
#[derive(Debug, Clone)]
pub struct HsvFrame {
    width: u32,
    height: u32,
    pixels: Vec<Hsv>,
}

impl HsvFrame {
    pub fn from_rgb_image(frame: &RgbImage) -> Self {
        let (width, height) = frame.dimensions();
        let pixels = frame.pixels().map(Hsv::from).collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[Hsv] {
        &self.pixels
    }

    /// `None` outside the frame.
    pub fn get(&self, x: u32, y: u32) -> Option<Hsv> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_land_on_expected_hues() {
        assert_eq!(Hsv::from_rgb(255, 0, 0), Hsv::new(0, 255, 255));
        assert_eq!(Hsv::from_rgb(0, 255, 0), Hsv::new(60, 255, 255));
        assert_eq!(Hsv::from_rgb(0, 0, 255), Hsv::new(120, 255, 255));
        assert_eq!(Hsv::from_rgb(255, 255, 0), Hsv::new(30, 255, 255));
    }

    #[test]
    fn greys_have_no_hue_or_saturation() {
        assert_eq!(Hsv::from_rgb(0, 0, 0), Hsv::new(0, 0, 0));
        assert_eq!(Hsv::from_rgb(128, 128, 128), Hsv::new(0, 0, 128));
        assert_eq!(Hsv::from_rgb(255, 255, 255), Hsv::new(0, 0, 255));
    }

    #[test]
    fn magenta_side_reds_wrap_near_the_top_of_the_hue_range() {
        // 340 degrees
        let hsv = Hsv::from_rgb(255, 0, 85);
        assert_eq!(hsv.hue, 170);

        // Just under 360 degrees rounds onto 0 rather than 180.
        let almost_red = Hsv::from_rgb(255, 0, 1);
        assert_eq!(almost_red.hue, 0);
    }

    #[test]
    fn frame_conversion_keeps_layout() {
        let mut frame = RgbImage::new(3, 2);
        frame.put_pixel(2, 1, Rgb([0, 0, 255]));
        let hsv = HsvFrame::from_rgb_image(&frame);
        assert_eq!(hsv.dimensions(), (3, 2));
        assert_eq!(hsv.pixels().len(), 6);
        assert_eq!(hsv.get(2, 1).map(|p| p.hue), Some(120));
        assert_eq!(hsv.get(0, 0), Some(Hsv::default()));
        assert_eq!(hsv.get(3, 0), None);
        assert_eq!(hsv.get(0, 2), None);
    }
}
