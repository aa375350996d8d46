//! Framegate - frame admission gating for remote visual localization
//!
//! This library gates a stream of camera-pose frames produced by a host
//! motion-tracking subsystem, deciding per frame whether the sample is good
//! enough to submit to a remote visual-localization service, and manages the
//! lifecycle of that submission: an ordered chain of toggleable quality
//! filters, a small connect/start/stop/localize state machine with anchor
//! bookkeeping and relative-pose math, rejection statistics for throughput
//! diagnostics, and deterministic simulation fixtures.
//!
//! The capture subsystem, the UI, and the transport of the localization
//! request are external collaborators; frames arrive as plain values and the
//! network side is a trait the host implements.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Anchor bookkeeping and relative-pose math.
pub mod anchor;
/// Remote filter configuration and its JSON loader.
pub mod config;
/// The frame admission pipeline and its individual filters.
pub mod filters;
/// Camera-pose frame value types.
pub mod frame;
/// Geographic coordinates, zones, and haversine distance.
pub mod geo;
/// The connect/start/stop/localize state machine.
pub mod session;
/// Deterministic fixtures standing in for live capture and network.
pub mod simulation;
/// Rejection counters for throughput diagnostics.
pub mod statistics;

// Re-export commonly used items for easier access
pub use anchor::{delta_pose, AnchorManager};
pub use config::{ConfigError, ConfigLoader, FilterConfig};
pub use filters::{
    FilterVerdict, FrameFilter, FrameFilterChain, ImageQualityScorer, RejectionReason,
};
pub use frame::{CameraIntrinsics, Frame, FrameImage, Pose, TrackingQuality};
pub use geo::{Coordinate, Zone, ZoneType};
pub use session::{
    ErrorMetadata, LocalizationClient, LocalizationError, LocalizationListener,
    LocalizationOutcome, LocalizationRequest, LocalizationResult, LocalizationSession,
    RequestCompletion, SessionState,
};
pub use simulation::{SimulatedLocalizationClient, SimulationFixture};
pub use statistics::RejectionStatistics;
