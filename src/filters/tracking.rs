// src/filters/tracking.rs

// Gates on the capture subsystem's own tracking health: anything but a
// normal tracking state is rejected before any image work happens.

use super::{FilterVerdict, FrameFilter, RejectionReason};
use crate::config::FilterConfig;
use crate::frame::{Frame, TrackingQuality};

/// Rejects frames whose tracking indicator is degraded.
#[derive(Debug, Default)]
pub struct TrackingFilter;

impl TrackingFilter {
    /// A tracking filter; it holds no state.
    pub fn new() -> Self {
        TrackingFilter
    }
}

impl FrameFilter for TrackingFilter {
    fn name(&self) -> &'static str {
        "tracking"
    }

    fn enabled(&self, config: &FilterConfig) -> bool {
        config.is_tracking_filter_enabled
    }

    fn check(&mut self, frame: &Frame, _config: &FilterConfig) -> FilterVerdict {
        match frame.tracking {
            TrackingQuality::Normal => FilterVerdict::Accepted,
            TrackingQuality::ExcessiveMotion => {
                FilterVerdict::Rejected(RejectionReason::ExcessiveMotion)
            }
            TrackingQuality::InsufficientFeatures => {
                FilterVerdict::Rejected(RejectionReason::InsufficientFeatures)
            }
            TrackingQuality::InsufficientLight
            | TrackingQuality::BadState
            | TrackingQuality::CameraUnavailable => {
                FilterVerdict::Rejected(RejectionReason::LossOfTracking)
            }
        }
    }
}
