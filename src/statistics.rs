// src/statistics.rs

// Rejection counters for diagnosing admission throughput. One counter per
// rejection reason plus a running total; only explicit resets clear it.

use crate::filters::RejectionReason;
use serde::{Deserialize, Serialize};

/// Tally of pipeline rejections, keyed by reason.
///
/// `total_frames` equals the number of `accumulate` calls; accepted frames
/// are never recorded here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionStatistics {
    excessive_motion: u64,
    insufficient_motion: u64,
    pitch_too_high: u64,
    pitch_too_low: u64,
    excessive_blur: u64,
    insufficient_image_quality: u64,
    loss_of_tracking: u64,
    insufficient_features: u64,
    total_frames: u64,
}

impl RejectionStatistics {
    /// An empty tally.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one rejection: bumps exactly the matching counter and the
    /// total. Touches nothing else.
    pub fn accumulate(&mut self, reason: RejectionReason) {
        match reason {
            RejectionReason::ExcessiveMotion => self.excessive_motion += 1,
            RejectionReason::InsufficientMotion => self.insufficient_motion += 1,
            RejectionReason::PitchTooHigh => self.pitch_too_high += 1,
            RejectionReason::PitchTooLow => self.pitch_too_low += 1,
            RejectionReason::ExcessiveBlur => self.excessive_blur += 1,
            RejectionReason::InsufficientImageQuality => self.insufficient_image_quality += 1,
            RejectionReason::LossOfTracking => self.loss_of_tracking += 1,
            RejectionReason::InsufficientFeatures => self.insufficient_features += 1,
        }
        self.total_frames += 1;
    }

    /// Rejections recorded for one reason.
    pub fn count(&self, reason: RejectionReason) -> u64 {
        match reason {
            RejectionReason::ExcessiveMotion => self.excessive_motion,
            RejectionReason::InsufficientMotion => self.insufficient_motion,
            RejectionReason::PitchTooHigh => self.pitch_too_high,
            RejectionReason::PitchTooLow => self.pitch_too_low,
            RejectionReason::ExcessiveBlur => self.excessive_blur,
            RejectionReason::InsufficientImageQuality => self.insufficient_image_quality,
            RejectionReason::LossOfTracking => self.loss_of_tracking,
            RejectionReason::InsufficientFeatures => self.insufficient_features,
        }
    }

    /// Total rejections recorded across all reasons.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Explicit reset; the pipeline never resets implicitly.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// One-line summary for debug displays.
    pub fn summary(&self) -> String {
        format!(
            "rejections: {} total (motion+ {} motion- {} pitch+ {} pitch- {} blur {} quality {} tracking {} features {})",
            self.total_frames,
            self.excessive_motion,
            self.insufficient_motion,
            self.pitch_too_high,
            self.pitch_too_low,
            self.excessive_blur,
            self.insufficient_image_quality,
            self.loss_of_tracking,
            self.insufficient_features,
        )
    }
}
