// src/filters/pitch.rs

// Gates on camera tilt so the service receives roughly street-level views.
// The orientation quaternion's x component is the pitch proxy; the accepted
// band is symmetric around zero with half-width PITCH_LIMIT.

use super::{FilterVerdict, FrameFilter, RejectionReason};
use crate::config::FilterConfig;
use crate::frame::Frame;

/// Half-width of the accepted pitch band on the quaternion x component.
const PITCH_LIMIT: f64 = std::f64::consts::FRAC_PI_8;

/// Rejects frames tilted too far up or down.
#[derive(Debug, Default)]
pub struct CameraPitchFilter;

impl CameraPitchFilter {
    /// A pitch filter; it holds no state.
    pub fn new() -> Self {
        CameraPitchFilter
    }
}

impl FrameFilter for CameraPitchFilter {
    fn name(&self) -> &'static str {
        "camera-pitch"
    }

    fn enabled(&self, config: &FilterConfig) -> bool {
        config.is_camera_pitch_filter_enabled
    }

    fn check(&mut self, frame: &Frame, _config: &FilterConfig) -> FilterVerdict {
        let pitch = frame.pose.orientation.i;
        if pitch > PITCH_LIMIT {
            FilterVerdict::Rejected(RejectionReason::PitchTooHigh)
        } else if pitch < -PITCH_LIMIT {
            FilterVerdict::Rejected(RejectionReason::PitchTooLow)
        } else {
            FilterVerdict::Accepted
        }
    }
}
