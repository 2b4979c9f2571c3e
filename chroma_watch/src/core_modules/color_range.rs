// THEORY:
// A `ColorClass` is a named region of HSV space. Most classes are a single box
// (`ColorRange`), but hue is circular: a color that straddles 0 degrees, such as
// red, cannot be described by one `lower..=upper` interval. Such a class carries
// two ranges, one on each side of the wrap, and the mask layer unions them.
//
// Classes are plain data. They are loaded once (from defaults or config) and never
// change while the process runs. The order of the list is the detection priority.

use crate::core_modules::hsv_pixel::{Channel, Hsv, MAX_HUE};
use serde::{Deserialize, Serialize};

/// One corner of an HSV box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvBound {
    pub hue: Channel,
    pub saturation: Channel,
    pub value: Channel,
}

impl HsvBound {
    pub const fn new(hue: Channel, saturation: Channel, value: Channel) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }
}

/// An inclusive box in HSV space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    pub lower: HsvBound,
    pub upper: HsvBound,
}

impl ColorRange {
    pub const fn new(lower: [Channel; 3], upper: [Channel; 3]) -> Self {
        Self {
            lower: HsvBound::new(lower[0], lower[1], lower[2]),
            upper: HsvBound::new(upper[0], upper[1], upper[2]),
        }
    }

    /// Inclusive on all three channels.
    #[inline]
    pub fn contains(&self, pixel: Hsv) -> bool {
        pixel.hue >= self.lower.hue
            && pixel.hue <= self.upper.hue
            && pixel.saturation >= self.lower.saturation
            && pixel.saturation <= self.upper.saturation
            && pixel.value >= self.lower.value
            && pixel.value <= self.upper.value
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.upper.hue > MAX_HUE {
            return Err(format!(
                "upper hue {} exceeds the maximum of {}",
                self.upper.hue, MAX_HUE
            ));
        }
        let pairs = [
            ("hue", self.lower.hue, self.upper.hue),
            ("saturation", self.lower.saturation, self.upper.saturation),
            ("value", self.lower.value, self.upper.value),
        ];
        for (channel, lower, upper) in pairs {
            if lower > upper {
                return Err(format!("{channel} lower bound {lower} is above upper bound {upper}"));
            }
        }
        Ok(())
    }
}

/// A named color made of one range, or two when its hue wraps around zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorClass {
    pub name: String,
    pub ranges: Vec<ColorRange>,
}

impl ColorClass {
    pub fn single(name: &str, range: ColorRange) -> Self {
        Self {
            name: name.to_string(),
            ranges: vec![range],
        }
    }

    pub fn wrapped(name: &str, low_side: ColorRange, high_side: ColorRange) -> Self {
        Self {
            name: name.to_string(),
            ranges: vec![low_side, high_side],
        }
    }

    pub fn contains(&self, pixel: Hsv) -> bool {
        self.ranges.iter().any(|range| range.contains(pixel))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.ranges.is_empty() || self.ranges.len() > 2 {
            return Err(format!(
                "color '{}' must have one or two ranges, found {}",
                self.name,
                self.ranges.len()
            ));
        }
        for range in &self.ranges {
            range
                .validate()
                .map_err(|reason| format!("color '{}': {reason}", self.name))?;
        }
        Ok(())
    }
}

/// The stock palette, in detection priority order.
pub fn default_palette() -> Vec<ColorClass> {
    vec![
        ColorClass::single("blue", ColorRange::new([100, 100, 50], [130, 255, 255])),
        ColorClass::wrapped(
            "red",
            ColorRange::new([0, 100, 50], [10, 255, 255]),
            ColorRange::new([160, 100, 50], [179, 255, 255]),
        ),
        ColorClass::single("green", ColorRange::new([40, 70, 50], [80, 255, 255])),
        ColorClass::single("yellow", ColorRange::new([20, 100, 100], [30, 255, 255])),
        ColorClass::single("white", ColorRange::new([0, 0, 200], [179, 30, 255])),
    ]
}
