// THEORY:
// The `motion_decision` module is the judgement layer. Once per detection attempt it
// walks the tracked colors in priority order and, for each one, compares where the
// color's blob is now with where it was on the previous attempt.
//
// Key rules:
// 1.  **Memory**: `TrackedCentroids` holds one slot per color. A slot starts empty
//     ("no prior observation"), so the very first attempt of a cycle can never
//     report motion; it only seeds positions.
// 2.  **Strict threshold**: motion requires a displacement strictly greater than
//     the threshold. Exactly equal is not motion.
// 3.  **First match wins**: the first color that moves ends the attempt. Colors
//     after it are not examined that frame and their slots keep their old values.
// 4.  **Occlusion keeps memory**: an empty mask leaves the slot alone rather than
//     clearing it, so a blob that briefly vanishes is still compared against its
//     last known position.
// 5.  **No write on trigger**: the slot of the color that triggered is not updated.

use crate::config::WatchConfig;
use crate::core_modules::centroid::{self, Point};
use crate::core_modules::color_mask;
use crate::core_modules::color_range::ColorClass;
use crate::core_modules::hsv_pixel::HsvFrame;
use crate::core_modules::morphology::MorphologicalFilter;
use image::RgbImage;
use tracing::{debug, trace};

/// Last known centroid per color, indexed like the color list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedCentroids {
    slots: Vec<Option<Point>>,
}

impl TrackedCentroids {
    pub fn new(color_count: usize) -> Self {
        Self {
            slots: vec![None; color_count],
        }
    }

    pub fn get(&self, index: usize) -> Option<Point> {
        self.slots.get(index).copied().flatten()
    }

    /// Every slot in priority order, `None` where nothing has been seen.
    pub fn positions(&self) -> impl Iterator<Item = Option<Point>> + '_ {
        self.slots.iter().copied()
    }

    fn store(&mut self, index: usize, point: Point) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(point);
        }
    }
}

/// The color that moved, and by how much.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionEvent {
    pub color_index: usize,
    pub color_name: String,
    pub previous: Point,
    pub current: Point,
    pub displacement: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    NoMotion,
    Motion(MotionEvent),
}

impl Decision {
    pub fn is_motion(&self) -> bool {
        matches!(self, Decision::Motion(_))
    }
}

/// Segments, filters and locates each color, then applies the rules above.
#[derive(Debug, Clone)]
pub struct MotionDecisionEngine {
    colors: Vec<ColorClass>,
    filter: MorphologicalFilter,
    motion_threshold: f64,
}

impl MotionDecisionEngine {
    pub fn new(colors: Vec<ColorClass>, filter: MorphologicalFilter, motion_threshold: f64) -> Self {
        Self {
            colors,
            filter,
            motion_threshold,
        }
    }

    pub fn from_config(config: &WatchConfig) -> Self {
        Self::new(
            config.colors.clone(),
            MorphologicalFilter::new(config.erode_radius, config.dilate_radius),
            config.motion_threshold_px,
        )
    }

    pub fn colors(&self) -> &[ColorClass] {
        &self.colors
    }

    pub fn motion_threshold(&self) -> f64 {
        self.motion_threshold
    }

    /// A fresh, all-empty memory sized for this engine's colors.
    pub fn new_tracking_state(&self) -> TrackedCentroids {
        TrackedCentroids::new(self.colors.len())
    }

    /// Mask, filter and locate one color in an already converted frame. An index
    /// past the color list has no blob.
    pub fn locate_color(&self, frame: &HsvFrame, index: usize) -> Option<Point> {
        let mask = color_mask::extract(frame, self.colors.get(index)?);
        let filtered = self.filter.apply(&mask);
        centroid::locate(&filtered)
    }

    /// Runs one detection attempt on a frame.
    pub fn evaluate(&self, frame: &RgbImage, tracked: &mut TrackedCentroids) -> Decision {
        let hsv = HsvFrame::from_rgb_image(frame);
        self.decide(tracked, |index| self.locate_color(&hsv, index))
    }

    /// The decision rules, with centroid lookup supplied by the caller. `locate` is
    /// called lazily in priority order and not at all for colors after a trigger.
    pub fn decide<F>(&self, tracked: &mut TrackedCentroids, mut locate: F) -> Decision
    where
        F: FnMut(usize) -> Option<Point>,
    {
        for (index, class) in self.colors.iter().enumerate() {
            let Some(current) = locate(index) else {
                trace!(color = %class.name, "no blob");
                continue;
            };

            if let Some(previous) = tracked.get(index) {
                let displacement = current.distance(&previous);
                if displacement > self.motion_threshold {
                    debug!(
                        color = %class.name,
                        displacement,
                        "displacement above threshold"
                    );
                    return Decision::Motion(MotionEvent {
                        color_index: index,
                        color_name: class.name.clone(),
                        previous,
                        current,
                        displacement,
                    });
                }
            }

            tracked.store(index, current);
        }

        Decision::NoMotion
    }
}
