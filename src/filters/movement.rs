// src/filters/movement.rs

// Requires the camera to have moved since the last accepted frame, so the
// service never receives a burst of near-identical viewpoints. The retained
// translation only advances on acceptance.

use super::{FilterVerdict, FrameFilter, RejectionReason};
use crate::config::FilterConfig;
use crate::frame::Frame;
use nalgebra::Vector3;

/// Rejects frames whose translation is too close to the last accepted one.
///
/// Acceptance requires the absolute displacement to exceed the configured
/// threshold on every axis; at-or-below-threshold displacement rejects as
/// `InsufficientMotion`. The retained translation starts at the origin.
#[derive(Debug)]
pub struct MovementFilter {
    last_accepted: Vector3<f64>,
}

impl MovementFilter {
    /// A movement filter with its reference translation at the origin.
    pub fn new() -> Self {
        MovementFilter {
            last_accepted: Vector3::zeros(),
        }
    }
}

impl Default for MovementFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameFilter for MovementFilter {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn enabled(&self, config: &FilterConfig) -> bool {
        config.is_movement_filter_enabled
    }

    fn check(&mut self, frame: &Frame, config: &FilterConfig) -> FilterVerdict {
        let displacement = (frame.pose.position - self.last_accepted).abs();
        let threshold = config.movement_filter_threshold;

        let moved = displacement.x > threshold
            && displacement.y > threshold
            && displacement.z > threshold;

        if moved {
            self.last_accepted = frame.pose.position;
            FilterVerdict::Accepted
        } else {
            FilterVerdict::Rejected(RejectionReason::InsufficientMotion)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{CameraIntrinsics, FrameImage, Pose, TrackingQuality};
    use nalgebra::UnitQuaternion;

    fn frame_at(x: f64, y: f64, z: f64) -> Frame {
        Frame {
            timestamp_ms: 0,
            pose: Pose {
                position: Vector3::new(x, y, z),
                orientation: UnitQuaternion::identity(),
            },
            tracking: TrackingQuality::Normal,
            intrinsics: CameraIntrinsics {
                fx: 1.0,
                fy: 1.0,
                cx: 0.0,
                cy: 0.0,
            },
            image: FrameImage::new(2, 2, vec![0; 4]),
            gravity: UnitQuaternion::identity(),
        }
    }

    #[test]
    fn below_threshold_displacement_rejects() {
        let mut filter = MovementFilter::new();
        let config = FilterConfig {
            movement_filter_threshold: 0.1,
            ..FilterConfig::default()
        };
        assert_eq!(
            filter.check(&frame_at(0.05, 0.05, 0.05), &config),
            FilterVerdict::Rejected(RejectionReason::InsufficientMotion)
        );
    }

    #[test]
    fn above_threshold_on_every_axis_accepts() {
        let mut filter = MovementFilter::new();
        let config = FilterConfig {
            movement_filter_threshold: 0.1,
            ..FilterConfig::default()
        };
        assert_eq!(
            filter.check(&frame_at(0.2, -0.2, 0.2), &config),
            FilterVerdict::Accepted
        );
    }

    #[test]
    fn one_stationary_axis_rejects() {
        let mut filter = MovementFilter::new();
        let config = FilterConfig {
            movement_filter_threshold: 0.1,
            ..FilterConfig::default()
        };
        assert_eq!(
            filter.check(&frame_at(0.5, 0.5, 0.0), &config),
            FilterVerdict::Rejected(RejectionReason::InsufficientMotion)
        );
    }

    #[test]
    fn retained_translation_advances_only_on_acceptance() {
        let mut filter = MovementFilter::new();
        let config = FilterConfig {
            movement_filter_threshold: 0.1,
            ..FilterConfig::default()
        };

        assert!(filter.check(&frame_at(1.0, 1.0, 1.0), &config).is_accepted());
        // Same spot: rejected, and the reference point must not move.
        assert!(!filter.check(&frame_at(1.0, 1.0, 1.0), &config).is_accepted());
        assert!(!filter
            .check(&frame_at(1.05, 1.05, 1.05), &config)
            .is_accepted());
        // Far enough from (1,1,1) on every axis again.
        assert!(filter.check(&frame_at(1.2, 0.8, 1.2), &config).is_accepted());
    }

    #[test]
    fn exactly_at_threshold_rejects() {
        let mut filter = MovementFilter::new();
        let config = FilterConfig {
            movement_filter_threshold: 0.1,
            ..FilterConfig::default()
        };
        assert!(!filter.check(&frame_at(0.1, 0.1, 0.1), &config).is_accepted());
    }
}
