// THEORY:
// All tunables live in one `WatchConfig`. Every field has a default, so a bare
// `WatchConfig::default()` reproduces the stock camera setup, and a YAML file only
// needs to mention the values it changes. The config is read once at start-up and
// is immutable afterwards.

use crate::core_modules::color_range::{ColorClass, default_palette};
use crate::error::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// The stock capture pipeline: 800x600 from libcamera, scaled down to 400x300 and
/// rotated 180 degrees, keeping only the two freshest buffers.
pub const DEFAULT_CAPTURE_PIPELINE: &str = "libcamerasrc ! video/x-raw, width=800, height=600 ! \
     videoconvert ! videoscale ! video/x-raw, width=400, height=300 ! \
     videoflip method=rotate-180 ! appsink drop=true max_buffers=2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// A GStreamer pipeline string ending in `appsink`.
    pub pipeline: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            pipeline: DEFAULT_CAPTURE_PIPELINE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Minimum centroid displacement, in pixels, that counts as motion. The
    /// comparison is strict.
    pub motion_threshold_px: f64,
    /// Wait after a "no motion" attempt before the next attempt.
    pub quiet_period_secs: f64,
    pub erode_radius: u32,
    pub dilate_radius: u32,
    /// Playback rate written into the clip.
    pub write_fps: f64,
    pub record_duration_secs: f64,
    pub output_path: String,
    /// Four-character codec code, e.g. `MJPG`.
    pub fourcc: String,
    pub capture: CaptureConfig,
    /// Tracked colors in priority order.
    pub colors: Vec<ColorClass>,
    pub show_preview: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            motion_threshold_px: 30.0,
            quiet_period_secs: 10.0,
            erode_radius: 2,
            dilate_radius: 2,
            write_fps: 15.0,
            record_duration_secs: 30.0,
            output_path: "motion.avi".to_string(),
            fourcc: "MJPG".to_string(),
            capture: CaptureConfig::default(),
            colors: default_palette(),
            show_preview: true,
        }
    }
}

impl WatchConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: WatchConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("motion_threshold_px", self.motion_threshold_px),
            ("write_fps", self.write_fps),
            ("record_duration_secs", self.record_duration_secs),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(WatchError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        Duration::try_from_secs_f64(self.quiet_period_secs).map_err(|err| {
            WatchError::Config(format!(
                "quiet_period_secs must be a representable duration of zero or more, got {}: {err}",
                self.quiet_period_secs
            ))
        })?;
        if self.fourcc.chars().count() != 4 || !self.fourcc.is_ascii() {
            return Err(WatchError::Config(format!(
                "fourcc must be four ASCII characters, got '{}'",
                self.fourcc
            )));
        }
        if self.colors.is_empty() {
            return Err(WatchError::Config("at least one color must be tracked".into()));
        }
        for class in &self.colors {
            class.validate().map_err(WatchError::Config)?;
        }
        Ok(())
    }

    /// Frames per clip: `fps * duration`, rounded half up, never below one.
    pub fn max_recording_frames(&self) -> u32 {
        ((self.write_fps * self.record_duration_secs + 0.5) as u32).max(1)
    }

    /// Saturates at `Duration::MAX` for values `validate` rejects.
    pub fn quiet_period(&self) -> Duration {
        Duration::try_from_secs_f64(self.quiet_period_secs).unwrap_or(Duration::MAX)
    }

    pub fn fourcc_chars(&self) -> [char; 4] {
        let mut chars = ['\0'; 4];
        for (slot, c) in chars.iter_mut().zip(self.fourcc.chars()) {
            *slot = c;
        }
        chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_range::ColorRange;

    #[test]
    fn defaults_are_valid() {
        let config = WatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.colors.len(), 5);
        assert_eq!(config.quiet_period(), Duration::from_secs(10));
    }

    #[test]
    fn clip_length_is_fps_times_duration() {
        let config = WatchConfig::default();
        assert_eq!(config.max_recording_frames(), 450);

        let fractional = WatchConfig {
            write_fps: 29.97,
            record_duration_secs: 2.0,
            ..WatchConfig::default()
        };
        // 59.94 rounds to 60
        assert_eq!(fractional.max_recording_frames(), 60);

        let half = WatchConfig {
            write_fps: 2.5,
            record_duration_secs: 1.0,
            ..WatchConfig::default()
        };
        assert_eq!(half.max_recording_frames(), 3);
    }

    #[test]
    fn yaml_overrides_only_what_it_names() {
        let yaml = "motion_threshold_px: 12.5\nquiet_period_secs: 3\noutput_path: clip.avi\n";
        let config: WatchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.motion_threshold_px, 12.5);
        assert_eq!(config.quiet_period_secs, 3.0);
        assert_eq!(config.output_path, "clip.avi");
        assert_eq!(config.erode_radius, 2);
        assert_eq!(config.fourcc, "MJPG");
        assert_eq!(config.capture, CaptureConfig::default());
    }

    #[test]
    fn yaml_can_replace_the_palette() {
        let yaml = r#"
colors:
  - name: orange
    ranges:
      - lower: { hue: 10, saturation: 100, value: 100 }
        upper: { hue: 20, saturation: 255, value: 255 }
"#;
        let config: WatchConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.colors.len(), 1);
        assert_eq!(config.colors[0].name, "orange");
        assert_eq!(
            config.colors[0].ranges[0],
            ColorRange::new([10, 100, 100], [20, 255, 255])
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_values_are_rejected() {
        let zero_fps = WatchConfig {
            write_fps: 0.0,
            ..WatchConfig::default()
        };
        assert!(matches!(zero_fps.validate(), Err(WatchError::Config(_))));

        let long_fourcc = WatchConfig {
            fourcc: "MJPEG".into(),
            ..WatchConfig::default()
        };
        assert!(long_fourcc.validate().is_err());

        let no_colors = WatchConfig {
            colors: vec![],
            ..WatchConfig::default()
        };
        assert!(no_colors.validate().is_err());

        let negative_quiet = WatchConfig {
            quiet_period_secs: -1.0,
            ..WatchConfig::default()
        };
        assert!(negative_quiet.validate().is_err());

        let endless_quiet = WatchConfig {
            quiet_period_secs: 1e30,
            ..WatchConfig::default()
        };
        assert!(matches!(endless_quiet.validate(), Err(WatchError::Config(_))));
        assert_eq!(endless_quiet.quiet_period(), Duration::MAX);
    }

    #[test]
    fn example_file_spells_out_the_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config.example.yaml");
        let config = WatchConfig::load(path).expect("example config should load");
        assert_eq!(config, WatchConfig::default());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = WatchConfig::load("/definitely/not/here.yaml");
        assert!(matches!(result, Err(WatchError::Io(_))));
    }
}
