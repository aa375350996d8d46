// src/filters/image_quality.rs

// Gates on a learned image-quality score. The scoring model itself is an
// external collaborator, referenced by URI/version in the config; the filter
// only compares its score against the configured floor. A contrast-based
// scorer is built in so the chain works without a model artifact.

use super::{FilterVerdict, FrameFilter, RejectionReason};
use crate::config::FilterConfig;
use crate::frame::{Frame, FrameImage};
use log::trace;

/// Scores an image in [0, 1]; higher is better.
pub trait ImageQualityScorer {
    /// Quality score of one image.
    fn score(&mut self, image: &FrameImage) -> f64;

    /// Version of the model behind this scorer, if any.
    fn model_version(&self) -> Option<&str> {
        None
    }
}

/// Fallback scorer: normalized luminance standard deviation. Crude, but
/// monotone in the contrast a localization backend needs.
#[derive(Debug, Default)]
pub struct ContrastScorer;

impl ContrastScorer {
    /// A contrast scorer; it holds no state.
    pub fn new() -> Self {
        ContrastScorer
    }
}

impl ImageQualityScorer for ContrastScorer {
    fn score(&mut self, image: &FrameImage) -> f64 {
        if image.data.is_empty() {
            return 0.0;
        }
        let n = image.data.len() as f64;
        let mean = image.data.iter().map(|&p| p as f64).sum::<f64>() / n;
        let var = image
            .data
            .iter()
            .map(|&p| {
                let d = p as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        // 127.5 is the largest possible standard deviation for u8 data.
        (var.sqrt() / 127.5).min(1.0)
    }
}

/// Rejects frames whose quality score falls below the configured threshold.
pub struct ImageQualityFilter {
    scorer: Box<dyn ImageQualityScorer + Send>,
}

impl ImageQualityFilter {
    /// A filter judging frames through the given scorer.
    pub fn new(scorer: Box<dyn ImageQualityScorer + Send>) -> Self {
        ImageQualityFilter { scorer }
    }
}

impl FrameFilter for ImageQualityFilter {
    fn name(&self) -> &'static str {
        "image-quality"
    }

    fn enabled(&self, config: &FilterConfig) -> bool {
        config.is_image_quality_filter_enabled
    }

    fn check(&mut self, frame: &Frame, config: &FilterConfig) -> FilterVerdict {
        let score = self.scorer.score(&frame.image);
        trace!(
            "image quality score {:.3} (model {:?})",
            score,
            self.scorer.model_version()
        );
        if score < config.image_quality_filter_score_threshold {
            FilterVerdict::Rejected(RejectionReason::InsufficientImageQuality)
        } else {
            FilterVerdict::Accepted
        }
    }
}
