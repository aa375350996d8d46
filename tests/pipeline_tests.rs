// tests/pipeline_tests.rs

// Pipeline-level tests across modules: crafted frames driving each rejection
// reason end to end, config hot-swap through the loader, and a mocked
// listener pinning the exactly-once delivery contract.

use framegate::{
    ConfigLoader, ErrorMetadata, FilterVerdict, FrameFilterChain, LocalizationError,
    LocalizationListener, LocalizationOutcome, LocalizationResult, LocalizationSession,
    RejectionReason, SimulatedLocalizationClient, SimulationFixture, TrackingQuality,
};
use mockall::predicate::always;
use nalgebra::Vector3;
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

fn fixture_frame(step: i64) -> framegate::Frame {
    let s = step as f64;
    SimulationFixture::parking().sample_frame(step * 33, Vector3::new(s, s + 0.1, s + 0.2))
}

#[rstest]
#[case(TrackingQuality::ExcessiveMotion, RejectionReason::ExcessiveMotion)]
#[case(TrackingQuality::InsufficientFeatures, RejectionReason::InsufficientFeatures)]
#[case(TrackingQuality::BadState, RejectionReason::LossOfTracking)]
fn degraded_tracking_maps_to_reason(
    #[case] tracking: TrackingQuality,
    #[case] expected: RejectionReason,
) {
    let mut chain = FrameFilterChain::new();
    let config = framegate::FilterConfig::default();
    let mut frame = fixture_frame(1);
    frame.tracking = tracking;
    assert_eq!(
        chain.evaluate(&frame, &config),
        FilterVerdict::Rejected(expected)
    );
}

#[test]
fn pitched_frame_rejects_after_movement_passes() {
    let mut chain = FrameFilterChain::new();
    let config = framegate::FilterConfig::default();

    let mut frame = fixture_frame(1);
    frame.pose = framegate::Pose::new(frame.pose.position, 0.6, 0.0, 0.0, 0.8);
    assert_eq!(
        chain.evaluate(&frame, &config),
        FilterVerdict::Rejected(RejectionReason::PitchTooHigh)
    );
}

#[test]
fn loaded_config_drives_the_chain_on_next_frame() {
    let mut loader = ConfigLoader::new();
    loader
        .load_json(
            r#"{
                "available": true,
                "failure_reason": "",
                "config": {
                    "config_id": "movement-off",
                    "frame_acceptance_timeout": "1.0",
                    "is_tracking_filter_enabled": true,
                    "is_movement_filter_enabled": false,
                    "movement_filter_threshold": "0.001",
                    "is_blur_filter_enabled": true,
                    "blur_filter_variance_threshold": "250.0",
                    "blur_filter_sudden_drop_threshold": "0.4",
                    "blur_filter_average_throughput_threshold": "25.0",
                    "is_camera_pitch_filter_enabled": true,
                    "is_image_quality_filter_enabled": true,
                    "image_quality_filter_score_threshold": "0.7"
                }
            }"#,
        )
        .unwrap();

    let mut chain = FrameFilterChain::new();
    let default_config = framegate::FilterConfig::default();

    let frame = fixture_frame(1);
    assert!(chain.evaluate(&frame, &default_config).is_accepted());
    // Stationary repeat: rejected under the default config, accepted under
    // the loaded one that disables the movement gate.
    assert_eq!(
        chain.evaluate(&frame, &default_config),
        FilterVerdict::Rejected(RejectionReason::InsufficientMotion)
    );
    assert!(chain.evaluate(&frame, loader.active()).is_accepted());
}

mockall::mock! {
    Listener {}

    impl LocalizationListener for Listener {
        fn on_location(&self, result: LocalizationResult);
        fn on_failure(&self, error: LocalizationError, metadata: Option<ErrorMetadata>);
        fn on_quality_timeout(&self, elapsed: Duration);
    }
}

#[test]
fn listener_hears_about_each_accepted_frame_exactly_once() {
    let fixture = SimulationFixture::parking();
    let client = SimulatedLocalizationClient::for_fixture(&fixture);

    let mut listener = MockListener::new();
    listener.expect_on_location().with(always()).times(2).return_const(());
    listener.expect_on_failure().times(0);
    listener.expect_on_quality_timeout().times(0).return_const(());

    let mut session = LocalizationSession::new(Box::new(client));
    session.set_simulation_fixture(Some(fixture));
    session.connect("token", Arc::new(listener));
    session.start_updating_location();

    // Two accepted frames, one stationary rejection in between. The
    // simulated client resolves synchronously, so both dispatch.
    session.localize(&fixture_frame(1));
    session.localize(&fixture_frame(1));
    session.localize(&fixture_frame(2));

    assert_eq!(
        session.statistics().count(RejectionReason::InsufficientMotion),
        1
    );
}

#[test]
fn outcome_display_is_readable() {
    let err = LocalizationError::Server {
        code: 404,
        message: "no map here".into(),
    };
    assert_eq!(err.to_string(), "server error 404: no map here");

    let outcome = LocalizationOutcome::Failed {
        error: LocalizationError::Network("timed out".into()),
        metadata: None,
    };
    match outcome {
        LocalizationOutcome::Failed { error, .. } => {
            assert_eq!(error.to_string(), "network error: timed out");
        }
        LocalizationOutcome::Located(_) => unreachable!(),
    }
}
