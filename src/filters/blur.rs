// src/filters/blur.rs

// Focus gate based on the variance of the image Laplacian: sharp images have
// strong edge response, motion-blurred ones do not. A bounded window of
// recent variances keeps two escape hatches open so a uniformly low-texture
// stream (night scenes, blank walls) still produces accepted frames.

use super::{FilterVerdict, FrameFilter, RejectionReason};
use crate::config::FilterConfig;
use crate::frame::{Frame, FrameImage};
use log::trace;
use std::collections::VecDeque;

/// Recent-variance window length.
const VARIANCE_WINDOW: usize = 8;

/// Rejects blurred frames by Laplacian variance.
///
/// A frame below the variance threshold is still accepted when the recent
/// average variance is itself below the average-throughput threshold and the
/// frame is not a sudden sharpness drop against that average. A sudden drop
/// on an otherwise sharp stream is the motion-blur signature and always
/// rejects.
#[derive(Debug)]
pub struct BlurFilter {
    recent_variances: VecDeque<f64>,
}

impl BlurFilter {
    /// A blur filter with an empty variance window.
    pub fn new() -> Self {
        BlurFilter {
            recent_variances: VecDeque::with_capacity(VARIANCE_WINDOW),
        }
    }

    fn recent_average(&self, fallback: f64) -> f64 {
        if self.recent_variances.is_empty() {
            return fallback;
        }
        self.recent_variances.iter().sum::<f64>() / self.recent_variances.len() as f64
    }

    fn record(&mut self, variance: f64) {
        if self.recent_variances.len() == VARIANCE_WINDOW {
            self.recent_variances.pop_front();
        }
        self.recent_variances.push_back(variance);
    }
}

impl Default for BlurFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameFilter for BlurFilter {
    fn name(&self) -> &'static str {
        "blur"
    }

    fn enabled(&self, config: &FilterConfig) -> bool {
        config.is_blur_filter_enabled
    }

    fn check(&mut self, frame: &Frame, config: &FilterConfig) -> FilterVerdict {
        let variance = laplacian_variance(&frame.image);
        let average = self.recent_average(variance);
        self.record(variance);

        trace!("blur variance {:.1}, recent average {:.1}", variance, average);

        if variance >= config.blur_filter_variance_threshold {
            return FilterVerdict::Accepted;
        }

        let uniformly_low_texture = average < config.blur_filter_average_throughput_threshold;
        let sudden_drop = variance < config.blur_filter_sudden_drop_threshold * average;
        if uniformly_low_texture && !sudden_drop {
            return FilterVerdict::Accepted;
        }

        FilterVerdict::Rejected(RejectionReason::ExcessiveBlur)
    }
}

/// Variance of the 4-neighbor Laplacian over interior pixels. Returns zero
/// for images too small to have an interior.
fn laplacian_variance(image: &FrameImage) -> f64 {
    let (w, h) = (image.width as usize, image.height as usize);
    if w < 3 || h < 3 || image.data.len() < w * h {
        return 0.0;
    }

    let px = |x: usize, y: usize| image.data[y * w + x] as f64;

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let count = ((w - 2) * (h - 2)) as f64;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let lap = 4.0 * px(x, y) - px(x - 1, y) - px(x + 1, y) - px(x, y - 1) - px(x, y + 1);
            sum += lap;
            sum_sq += lap * lap;
        }
    }

    let mean = sum / count;
    sum_sq / count - mean * mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{CameraIntrinsics, Pose, TrackingQuality};
    use nalgebra::UnitQuaternion;

    fn frame_with_image(image: FrameImage) -> Frame {
        Frame {
            timestamp_ms: 0,
            pose: Pose::identity(),
            tracking: TrackingQuality::Normal,
            intrinsics: CameraIntrinsics {
                fx: 1.0,
                fy: 1.0,
                cx: 0.0,
                cy: 0.0,
            },
            image,
            gravity: UnitQuaternion::identity(),
        }
    }

    fn checkerboard(levels: (u8, u8)) -> FrameImage {
        let (w, h) = (16u32, 16u32);
        let data = (0..w * h)
            .map(|i| {
                let (x, y) = (i % w, i / w);
                if (x + y) % 2 == 0 { levels.0 } else { levels.1 }
            })
            .collect();
        FrameImage::new(w, h, data)
    }

    fn flat() -> FrameImage {
        FrameImage::new(16, 16, vec![128; 256])
    }

    #[test]
    fn laplacian_variance_of_flat_image_is_zero() {
        assert_eq!(laplacian_variance(&flat()), 0.0);
    }

    #[test]
    fn laplacian_variance_of_checkerboard_is_high() {
        assert!(laplacian_variance(&checkerboard((0, 255))) > 100_000.0);
    }

    #[test]
    fn sharp_frame_accepts() {
        let mut filter = BlurFilter::new();
        let config = FilterConfig::default();
        assert!(filter
            .check(&frame_with_image(checkerboard((0, 255))), &config)
            .is_accepted());
    }

    #[test]
    fn mild_texture_below_threshold_rejects() {
        // 0/2 checkerboard: variance 64, under the 250 threshold but above
        // the 25 throughput floor, so there is no low-texture escape.
        let mut filter = BlurFilter::new();
        let config = FilterConfig::default();
        assert_eq!(
            filter.check(&frame_with_image(checkerboard((0, 2))), &config),
            FilterVerdict::Rejected(RejectionReason::ExcessiveBlur)
        );
    }

    #[test]
    fn uniformly_low_texture_stream_keeps_flowing() {
        let mut filter = BlurFilter::new();
        let config = FilterConfig::default();
        for _ in 0..4 {
            assert!(filter.check(&frame_with_image(flat()), &config).is_accepted());
        }
    }

    #[test]
    fn sudden_drop_on_sharp_stream_rejects() {
        let mut filter = BlurFilter::new();
        let config = FilterConfig::default();
        for _ in 0..4 {
            assert!(filter
                .check(&frame_with_image(checkerboard((0, 255))), &config)
                .is_accepted());
        }
        assert_eq!(
            filter.check(&frame_with_image(flat()), &config),
            FilterVerdict::Rejected(RejectionReason::ExcessiveBlur)
        );
    }

    #[test]
    fn tiny_image_counts_as_blurred_not_panicking() {
        let mut filter = BlurFilter::new();
        let config = FilterConfig {
            blur_filter_average_throughput_threshold: 0.0,
            ..FilterConfig::default()
        };
        let image = FrameImage::new(2, 2, vec![255; 4]);
        assert_eq!(
            filter.check(&frame_with_image(image), &config),
            FilterVerdict::Rejected(RejectionReason::ExcessiveBlur)
        );
    }
}
