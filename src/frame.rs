// src/frame.rs

// Value types for camera-pose samples delivered by the host capture
// subsystem. Frames are read-only to this crate: they are produced at sensor
// cadence with monotonically non-decreasing timestamps and carry everything
// the admission pipeline and request builder need.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Camera position and orientation. Plain value type, no identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Pose {
    /// Position in meters (x, y, z).
    pub position: Vector3<f64>,
    /// Unit orientation quaternion.
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    /// Builds a pose from raw components, normalizing the quaternion.
    pub fn new(position: Vector3<f64>, qx: f64, qy: f64, qz: f64, qw: f64) -> Self {
        Pose {
            position,
            orientation: UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz)),
        }
    }

    /// Identity pose: zero position, identity orientation.
    pub fn identity() -> Self {
        Pose {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

/// Tracking health reported by the capture subsystem for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingQuality {
    /// Tracking is healthy.
    Normal,
    /// The device moved too fast to track reliably.
    ExcessiveMotion,
    /// Too few visual features in view.
    InsufficientFeatures,
    /// Scene too dark to track.
    InsufficientLight,
    /// The tracker is in a degraded internal state.
    BadState,
    /// No camera frames are arriving.
    CameraUnavailable,
}

/// Pinhole camera intrinsics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length in pixels, x.
    pub fx: f64,
    /// Focal length in pixels, y.
    pub fy: f64,
    /// Principal point, x.
    pub cx: f64,
    /// Principal point, y.
    pub cy: f64,
}

/// Raw 8-bit luminance image attached to a frame. Encoding for transport is
/// the network collaborator's concern; the bytes are carried opaquely.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major luminance bytes, `width * height` of them.
    pub data: Vec<u8>,
}

impl FrameImage {
    /// Wraps raw luminance bytes; `data` must hold `width * height` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height) as usize);
        FrameImage { width, height, data }
    }
}

/// One camera-pose sample from the host motion-tracking subsystem.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Capture time, epoch milliseconds.
    pub timestamp_ms: i64,
    /// Camera pose at capture time.
    pub pose: Pose,
    /// Tracker health for this sample.
    pub tracking: TrackingQuality,
    /// Intrinsics of the capturing camera.
    pub intrinsics: CameraIntrinsics,
    /// Luminance image captured with the pose.
    pub image: FrameImage,
    /// Device gravity expressed as an orientation quaternion.
    pub gravity: UnitQuaternion<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_new_normalizes_orientation() {
        let pose = Pose::new(Vector3::zeros(), 0.0, 0.0, 0.0, 2.0);
        assert!((pose.orientation.norm() - 1.0).abs() < 1e-12);
        assert!((pose.orientation.w - 1.0).abs() < 1e-12);
    }

    #[test]
    fn identity_pose_is_identity() {
        let pose = Pose::identity();
        assert_eq!(pose.position, Vector3::zeros());
        assert_eq!(pose.orientation, UnitQuaternion::identity());
    }
}
