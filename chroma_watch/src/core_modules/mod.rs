pub mod centroid;
pub mod color_mask;
pub mod color_range;
pub mod hsv_pixel;
pub mod morphology;
pub mod motion_decision;
pub mod quiet_period;
pub mod recording_session;
