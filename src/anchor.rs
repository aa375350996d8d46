// src/anchor.rs

// Anchor bookkeeping and relative-pose math. A session holds at most one
// anchor frame; every later frame can be expressed in the anchor's local
// coordinate frame for the localization request.

use crate::frame::{Frame, Pose};
use log::debug;

/// Owns the single optional anchor frame of a session.
///
/// `set` is first-call-wins: re-anchoring requires an explicit `clear` first,
/// so all delta poses within one anchor epoch stay comparable.
#[derive(Debug, Default)]
pub struct AnchorManager {
    anchor: Option<Frame>,
}

impl AnchorManager {
    /// A manager with no anchor set.
    pub fn new() -> Self {
        AnchorManager { anchor: None }
    }

    /// Stores `frame` as the anchor unless one is already set.
    /// Returns whether the frame was taken.
    pub fn set(&mut self, frame: Frame) -> bool {
        if self.anchor.is_some() {
            debug!("anchor already set, ignoring new anchor frame");
            return false;
        }
        self.anchor = Some(frame);
        true
    }

    /// Discards the anchor, allowing a new `set`.
    pub fn clear(&mut self) {
        self.anchor = None;
    }

    /// The current anchor frame, if any.
    pub fn get(&self) -> Option<&Frame> {
        self.anchor.as_ref()
    }

    /// Whether an anchor is currently set.
    pub fn is_set(&self) -> bool {
        self.anchor.is_some()
    }

    /// Pose of `frame` expressed in the anchor's local frame, or identity
    /// when no anchor is set.
    pub fn delta_pose_for(&self, frame: &Frame) -> Pose {
        delta_pose(self.anchor.as_ref().map(|a| &a.pose), Some(&frame.pose))
    }
}

/// Pose of `current` expressed in `anchor`'s local frame:
/// orientation = anchor.orientation⁻¹ ⊗ current.orientation, position =
/// anchor.orientation⁻¹ · (current.position − anchor.position).
///
/// A missing input yields the identity pose; that is the defined fallback,
/// not an error.
pub fn delta_pose(anchor: Option<&Pose>, current: Option<&Pose>) -> Pose {
    let (anchor, current) = match (anchor, current) {
        (Some(a), Some(c)) => (a, c),
        _ => return Pose::identity(),
    };

    let inv = anchor.orientation.inverse();
    Pose {
        position: inv * (current.position - anchor.position),
        orientation: inv * current.orientation,
    }
}
