// src/filters/mod.rs

// The frame admission pipeline: five independent quality filters behind one
// trait, composed in a fixed order with short-circuit semantics. Filters are
// toggled per evaluation from the active config snapshot, so a config swap
// takes effect on the very next frame without a restart.

/// Laplacian-variance focus gate.
pub mod blur;
/// Learned image-quality gate with a contrast fallback.
pub mod image_quality;
/// Minimum-displacement gate against the last accepted frame.
pub mod movement;
/// Camera tilt gate.
pub mod pitch;
/// Tracker-health gate.
pub mod tracking;

pub use blur::BlurFilter;
pub use image_quality::{ContrastScorer, ImageQualityFilter, ImageQualityScorer};
pub use movement::MovementFilter;
pub use pitch::CameraPitchFilter;
pub use tracking::TrackingFilter;

use crate::config::FilterConfig;
use crate::frame::Frame;
use log::debug;
use serde::{Deserialize, Serialize};

/// Why a frame was declined. Exactly one reason per rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The tracker reported the device moving too fast.
    ExcessiveMotion,
    /// The camera did not move enough since the last accepted frame.
    InsufficientMotion,
    /// Camera tilted too far up.
    PitchTooHigh,
    /// Camera tilted too far down.
    PitchTooLow,
    /// The image is too blurred to localize against.
    ExcessiveBlur,
    /// The learned quality score fell below the configured floor.
    InsufficientImageQuality,
    /// The tracker lost its fix entirely.
    LossOfTracking,
    /// Too few visual features to track.
    InsufficientFeatures,
}

/// Outcome of one filter evaluation; exactly one variant holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterVerdict {
    /// The frame may proceed.
    Accepted,
    /// The frame was declined for the given reason.
    Rejected(RejectionReason),
}

impl FilterVerdict {
    /// Whether this verdict lets the frame through.
    pub fn is_accepted(&self) -> bool {
        matches!(self, FilterVerdict::Accepted)
    }
}

/// One admission criterion. Filters own whatever small state they need
/// (e.g. the movement filter's last accepted translation) and read their
/// thresholds from the config snapshot on every call.
pub trait FrameFilter {
    /// Short name for log lines.
    fn name(&self) -> &'static str;

    /// Whether this filter participates under the given config. Disabled
    /// filters are skipped entirely, never evaluated.
    fn enabled(&self, config: &FilterConfig) -> bool;

    /// Judges one frame against this filter's criterion.
    fn check(&mut self, frame: &Frame, config: &FilterConfig) -> FilterVerdict;
}

/// The ordered chain: tracking → movement → blur → pitch → image quality.
/// Stops at the first rejection.
pub struct FrameFilterChain {
    filters: Vec<Box<dyn FrameFilter + Send>>,
}

impl FrameFilterChain {
    /// Builds the standard chain with the default image-quality scorer.
    pub fn new() -> Self {
        Self::with_scorer(Box::new(ContrastScorer::new()))
    }

    /// Builds the standard chain around a caller-supplied scoring model.
    pub fn with_scorer(scorer: Box<dyn ImageQualityScorer + Send>) -> Self {
        FrameFilterChain {
            filters: vec![
                Box::new(TrackingFilter::new()),
                Box::new(MovementFilter::new()),
                Box::new(BlurFilter::new()),
                Box::new(CameraPitchFilter::new()),
                Box::new(ImageQualityFilter::new(scorer)),
            ],
        }
    }

    /// Runs the enabled filters in order, returning the first rejection or
    /// `Accepted` if every enabled filter passed.
    pub fn evaluate(&mut self, frame: &Frame, config: &FilterConfig) -> FilterVerdict {
        for filter in &mut self.filters {
            if !filter.enabled(config) {
                continue;
            }
            if let FilterVerdict::Rejected(reason) = filter.check(frame, config) {
                debug!("frame rejected by {}: {:?}", filter.name(), reason);
                return FilterVerdict::Rejected(reason);
            }
        }
        FilterVerdict::Accepted
    }
}

impl Default for FrameFilterChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{CameraIntrinsics, FrameImage, Pose, TrackingQuality};
    use nalgebra::{UnitQuaternion, Vector3};

    fn checkerboard(width: u32, height: u32) -> FrameImage {
        let data = (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                if (x + y) % 2 == 0 { 255 } else { 0 }
            })
            .collect();
        FrameImage::new(width, height, data)
    }

    fn frame_at(position: Vector3<f64>) -> Frame {
        Frame {
            timestamp_ms: 0,
            pose: Pose {
                position,
                orientation: UnitQuaternion::identity(),
            },
            tracking: TrackingQuality::Normal,
            intrinsics: CameraIntrinsics {
                fx: 1000.0,
                fy: 1000.0,
                cx: 320.0,
                cy: 240.0,
            },
            image: checkerboard(16, 16),
            gravity: UnitQuaternion::identity(),
        }
    }

    fn permissive_config() -> FilterConfig {
        FilterConfig {
            blur_filter_variance_threshold: 1.0,
            image_quality_filter_score_threshold: 0.0,
            ..FilterConfig::default()
        }
    }

    #[test]
    fn good_frame_passes_whole_chain() {
        let mut chain = FrameFilterChain::new();
        let frame = frame_at(Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(
            chain.evaluate(&frame, &permissive_config()),
            FilterVerdict::Accepted
        );
    }

    #[test]
    fn tracking_rejection_short_circuits_movement_state() {
        let mut chain = FrameFilterChain::new();
        let config = permissive_config();

        let mut bad = frame_at(Vector3::new(1.0, 1.0, 1.0));
        bad.tracking = TrackingQuality::InsufficientLight;
        assert_eq!(
            chain.evaluate(&bad, &config),
            FilterVerdict::Rejected(RejectionReason::LossOfTracking)
        );

        // The movement filter never saw the bad frame, so the same
        // translation must still be judged against the origin and pass.
        let good = frame_at(Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(chain.evaluate(&good, &config), FilterVerdict::Accepted);
    }

    #[test]
    fn disabled_filter_is_never_the_rejection_cause() {
        let mut chain = FrameFilterChain::new();
        let config = FilterConfig {
            is_tracking_filter_enabled: false,
            ..permissive_config()
        };

        let mut frame = frame_at(Vector3::new(1.0, 1.0, 1.0));
        frame.tracking = TrackingQuality::CameraUnavailable;
        assert_eq!(chain.evaluate(&frame, &config), FilterVerdict::Accepted);
    }

    #[test]
    fn config_swap_applies_on_next_frame() {
        let mut chain = FrameFilterChain::new();
        let strict = permissive_config();
        let lax = FilterConfig {
            is_movement_filter_enabled: false,
            ..permissive_config()
        };

        let frame = frame_at(Vector3::new(1.0, 1.0, 1.0));
        assert!(chain.evaluate(&frame, &strict).is_accepted());
        // Same translation again: insufficient motion under the strict
        // config, accepted once the movement filter is toggled off.
        assert_eq!(
            chain.evaluate(&frame, &strict),
            FilterVerdict::Rejected(RejectionReason::InsufficientMotion)
        );
        assert!(chain.evaluate(&frame, &lax).is_accepted());
    }

    #[test]
    fn movement_rejection_reported_before_pitch() {
        // Order is fixed: a frame failing both movement and pitch reports
        // the movement reason.
        let mut chain = FrameFilterChain::new();
        let config = permissive_config();

        let first = frame_at(Vector3::new(1.0, 1.0, 1.0));
        assert!(chain.evaluate(&first, &config).is_accepted());

        let mut again = frame_at(Vector3::new(1.0, 1.0, 1.0));
        again.pose = Pose::new(Vector3::new(1.0, 1.0, 1.0), 0.9, 0.0, 0.0, 0.4);
        assert_eq!(
            chain.evaluate(&again, &config),
            FilterVerdict::Rejected(RejectionReason::InsufficientMotion)
        );
    }
}
